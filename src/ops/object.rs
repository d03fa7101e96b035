//! Object CRUD operations.

use bytes::Bytes;

use crate::errors::S3Error;
use crate::ops::bucket::require_bucket;
use crate::ops::now_iso8601;
use crate::validation::validate_object_key;
use crate::AppState;

/// Content type recorded (and served) when the client supplies none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Store an object: write the bytes, upsert the catalog row, recompute the
/// bucket status. A put to an existing key is a full overwrite.
pub fn put_object(
    state: &AppState,
    bucket: &str,
    key: &str,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<(), S3Error> {
    require_bucket(state, bucket)?;
    validate_object_key(key)?;

    let objects = state.catalogs.objects(bucket)?;
    // The update lock spans the byte write, the row upsert, and the status
    // recomputation, so the bucket status never lags a finished mutation.
    let _guard = objects.lock_updates();

    let size = state.storage.write_object(bucket, key, data)?;
    let now = now_iso8601();
    let content_type = content_type.filter(|c| !c.is_empty()).unwrap_or(DEFAULT_CONTENT_TYPE);
    objects.put_object(key, content_type, size, &now)?;
    state
        .catalogs
        .buckets()
        .mark_status(bucket, !objects.is_empty()?, &now)?;
    Ok(())
}

/// Fetch an object's bytes and recorded content type. Never mutates metadata.
pub fn get_object(state: &AppState, bucket: &str, key: &str) -> Result<(Bytes, String), S3Error> {
    require_bucket(state, bucket)?;
    validate_object_key(key)?;

    let objects = state.catalogs.objects(bucket)?;
    let Some(record) = objects.get(key)? else {
        return Err(S3Error::NoSuchKey {
            key: key.to_string(),
        });
    };
    let Some(data) = state.storage.read_object(bucket, key)? else {
        return Err(S3Error::NoSuchKey {
            key: key.to_string(),
        });
    };

    let content_type = if record.content_type.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        record.content_type
    };
    Ok((data, content_type))
}

/// Delete an object: remove the file, drop the catalog row, recompute the
/// bucket status.
pub fn delete_object(state: &AppState, bucket: &str, key: &str) -> Result<(), S3Error> {
    require_bucket(state, bucket)?;
    validate_object_key(key)?;

    let objects = state.catalogs.objects(bucket)?;
    let _guard = objects.lock_updates();

    if !objects.contains(key)? || !state.storage.object_exists(bucket, key) {
        return Err(S3Error::NoSuchKey {
            key: key.to_string(),
        });
    }

    state.storage.remove_object(bucket, key)?;
    objects.remove_object(key)?;
    state
        .catalogs
        .buckets()
        .mark_status(bucket, !objects.is_empty()?, &now_iso8601())?;
    Ok(())
}
