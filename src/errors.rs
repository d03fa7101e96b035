//! S3-style error types.
//!
//! Every variant maps to a well-known error code.  The enum implements
//! [`axum::response::IntoResponse`] so handlers can simply return
//! `Err(S3Error::NoSuchBucket { .. })`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::xml::render_error;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// Error codes for the storage API expressed as a Rust enum.
#[derive(Debug, Error)]
pub enum S3Error {
    /// The specified bucket name violates the naming policy.
    #[error("The specified bucket is not valid.")]
    InvalidBucketName { name: String },

    /// The specified object key violates the key policy.
    #[error("The specified object key is not valid.")]
    InvalidObjectKey { key: String },

    /// A bucket with the requested name already exists.
    #[error("The requested bucket name is not available. Please select a different name and try again.")]
    BucketAlreadyExists { bucket: String },

    /// The specified bucket does not exist.
    #[error("The specified bucket does not exist")]
    NoSuchBucket { bucket: String },

    /// The specified key does not exist.
    #[error("The resource you requested does not exist")]
    NoSuchKey { key: String },

    /// The bucket you tried to delete is not empty.
    #[error("The bucket you tried to delete is not empty")]
    BucketNotEmpty { bucket: String },

    /// Catch-all for unexpected filesystem or catalog failures, including a
    /// directory existing without a matching catalog row.
    #[error("We encountered an internal error, please try again.")]
    InternalError(#[from] anyhow::Error),
}

impl S3Error {
    /// Return the XML error code string.
    pub fn code(&self) -> &'static str {
        match self {
            S3Error::InvalidBucketName { .. } => "InvalidBucketName",
            S3Error::InvalidObjectKey { .. } => "InvalidObjectKey",
            S3Error::BucketAlreadyExists { .. } => "BucketAlreadyExists",
            S3Error::NoSuchBucket { .. } => "NoSuchBucket",
            S3Error::NoSuchKey { .. } => "NoSuchKey",
            S3Error::BucketNotEmpty { .. } => "BucketNotEmpty",
            S3Error::InternalError(_) => "InternalError",
        }
    }

    /// Return the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            S3Error::InvalidBucketName { .. } => StatusCode::BAD_REQUEST,
            S3Error::InvalidObjectKey { .. } => StatusCode::BAD_REQUEST,
            S3Error::BucketAlreadyExists { .. } => StatusCode::CONFLICT,
            S3Error::NoSuchBucket { .. } => StatusCode::NOT_FOUND,
            S3Error::NoSuchKey { .. } => StatusCode::NOT_FOUND,
            S3Error::BucketNotEmpty { .. } => StatusCode::CONFLICT,
            S3Error::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The resource path to report in the XML error body.
    fn resource(&self) -> String {
        match self {
            S3Error::InvalidBucketName { name } => format!("/{name}"),
            S3Error::InvalidObjectKey { key } => format!("/{key}"),
            S3Error::BucketAlreadyExists { bucket } => format!("/{bucket}"),
            S3Error::NoSuchBucket { bucket } => format!("/{bucket}"),
            S3Error::NoSuchKey { key } => format!("/{key}"),
            S3Error::BucketNotEmpty { bucket } => format!("/{bucket}"),
            S3Error::InternalError(_) => String::new(),
        }
    }
}

impl IntoResponse for S3Error {
    fn into_response(self) -> Response {
        let request_id = generate_request_id();
        let status = self.status_code();
        let date = httpdate::fmt_http_date(std::time::SystemTime::now());

        if let S3Error::InternalError(ref err) = self {
            tracing::error!("internal error: {err:#}");
        }

        let body = render_error(self.code(), &self.to_string(), &self.resource(), &request_id);

        (
            status,
            [
                ("content-type", "application/xml".to_string()),
                ("x-amz-request-id", request_id),
                ("date", date),
                ("server", "triple-s".to_string()),
            ],
            body,
        )
            .into_response()
    }
}
