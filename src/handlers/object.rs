//! Object-level handlers.

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::info;

use crate::errors::S3Error;
use crate::ops;
use crate::AppState;

/// `PUT /:bucket/*key` -- PutObject.
///
/// The content type is taken from the request header; the catalog records
/// the default binary type when the client sends none.
pub async fn put_object(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Response, S3Error> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());

    ops::object::put_object(&state, bucket, key, content_type, body)?;
    info!(bucket, key, size = body.len(), "stored object");
    Ok(StatusCode::OK.into_response())
}

/// `GET /:bucket/*key` -- GetObject.
pub async fn get_object(state: Arc<AppState>, bucket: &str, key: &str) -> Result<Response, S3Error> {
    let (data, content_type) = ops::object::get_object(&state, bucket, key)?;
    Ok((
        StatusCode::OK,
        [
            ("content-type", content_type),
            ("content-length", data.len().to_string()),
        ],
        data,
    )
        .into_response())
}

/// `DELETE /:bucket/*key` -- DeleteObject.
pub async fn delete_object(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
) -> Result<Response, S3Error> {
    ops::object::delete_object(&state, bucket, key)?;
    info!(bucket, key, "deleted object");
    Ok(StatusCode::NO_CONTENT.into_response())
}
