//! Bucket-level handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::info;

use crate::errors::S3Error;
use crate::ops;
use crate::xml;
use crate::AppState;

/// `GET /` -- ListBuckets.
pub async fn list_buckets(state: Arc<AppState>) -> Result<Response, S3Error> {
    let buckets = ops::bucket::list_buckets(&state)?;
    let body = xml::render_list_buckets_result(&buckets);
    Ok((
        StatusCode::OK,
        [("content-type", "application/xml")],
        body,
    )
        .into_response())
}

/// `PUT /:bucket` -- CreateBucket.
pub async fn create_bucket(state: Arc<AppState>, bucket: &str) -> Result<Response, S3Error> {
    ops::bucket::create_bucket(&state, bucket)?;
    info!(bucket, "created bucket");
    Ok((
        StatusCode::OK,
        [("location", format!("/{bucket}"))],
    )
        .into_response())
}

/// `DELETE /:bucket` -- DeleteBucket.
pub async fn delete_bucket(state: Arc<AppState>, bucket: &str) -> Result<Response, S3Error> {
    ops::bucket::delete_bucket(&state, bucket)?;
    info!(bucket, "deleted bucket");
    Ok(StatusCode::NO_CONTENT.into_response())
}
