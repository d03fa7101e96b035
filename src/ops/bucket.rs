//! Bucket lifecycle operations.
//!
//! A bucket moves Absent -> Inactive -> Active -> Inactive -> Absent: it is
//! created empty, turns Active when its first object lands, turns Inactive
//! again when the last object is removed, and can only be deleted while
//! empty.

use crate::catalog::bucket::BucketRecord;
use crate::errors::S3Error;
use crate::ops::now_iso8601;
use crate::validation::validate_bucket_name;
use crate::AppState;

/// Create a bucket: directory, empty object catalog, then the catalog row.
///
/// Failures after the directory is created are not rolled back; they surface
/// as InternalError and a retry reports BucketAlreadyExists.
pub fn create_bucket(state: &AppState, name: &str) -> Result<(), S3Error> {
    validate_bucket_name(name)?;

    if state.storage.bucket_dir_exists(name) || state.catalogs.buckets().exists(name)? {
        return Err(S3Error::BucketAlreadyExists {
            bucket: name.to_string(),
        });
    }

    // Two concurrent creates can both pass the check above; directory
    // creation is the atomic arbiter, so the loser's io error maps to the
    // same conflict as the check.
    if let Err(err) = state.storage.create_bucket_dir(name) {
        return Err(match err.downcast_ref::<std::io::Error>() {
            Some(io) if io.kind() == std::io::ErrorKind::AlreadyExists => {
                S3Error::BucketAlreadyExists {
                    bucket: name.to_string(),
                }
            }
            _ => S3Error::InternalError(err),
        });
    }
    state.catalogs.objects(name)?;
    state.catalogs.buckets().add_bucket(name, &now_iso8601())?;
    Ok(())
}

/// Delete an empty bucket: directory tree, catalog row, cached handle.
pub fn delete_bucket(state: &AppState, name: &str) -> Result<(), S3Error> {
    if !state.catalogs.buckets().exists(name)? || !state.storage.bucket_dir_exists(name) {
        return Err(S3Error::NoSuchBucket {
            bucket: name.to_string(),
        });
    }

    let objects = state.catalogs.objects(name)?;
    {
        let _guard = objects.lock_updates();
        if !objects.is_empty()? {
            return Err(S3Error::BucketNotEmpty {
                bucket: name.to_string(),
            });
        }
        state.storage.remove_bucket_dir(name)?;
        state.catalogs.buckets().remove_bucket(name)?;
    }
    state.catalogs.evict(name);
    Ok(())
}

/// All buckets with an existing backing directory.
pub fn list_buckets(state: &AppState) -> Result<Vec<BucketRecord>, S3Error> {
    Ok(state.catalogs.buckets().list_buckets()?)
}

/// Check that `bucket` exists in both the catalog and on disk.
///
/// A directory with no catalog row (or the reverse) means the two stores
/// have diverged and is reported as an internal error, not NotFound.
pub(crate) fn require_bucket(state: &AppState, bucket: &str) -> Result<(), S3Error> {
    let has_row = state.catalogs.buckets().exists(bucket)?;
    let has_dir = state.storage.bucket_dir_exists(bucket);
    match (has_row, has_dir) {
        (true, true) => Ok(()),
        (false, false) => Err(S3Error::NoSuchBucket {
            bucket: bucket.to_string(),
        }),
        (false, true) => Err(S3Error::InternalError(anyhow::anyhow!(
            "bucket directory {bucket:?} exists without a catalog row"
        ))),
        (true, false) => Err(S3Error::InternalError(anyhow::anyhow!(
            "bucket {bucket:?} has a catalog row but no directory"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::bucket::BucketStatus;
    use crate::config::Config;
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let mut config = Config::default();
        config.storage.root = tmp.path().to_path_buf();
        let state = AppState::new(config).expect("failed to build state");
        (state, tmp)
    }

    #[test]
    fn test_create_bucket() {
        let (state, tmp) = test_state();
        create_bucket(&state, "my-bucket").unwrap();

        assert!(tmp.path().join("my-bucket").is_dir());
        assert!(tmp.path().join("my-bucket/objects.csv").is_file());
        let record = state.catalogs.buckets().get("my-bucket").unwrap().unwrap();
        assert_eq!(record.status, BucketStatus::Inactive);
    }

    #[test]
    fn test_create_bucket_invalid_name() {
        let (state, _tmp) = test_state();
        let err = create_bucket(&state, "AB").unwrap_err();
        assert!(matches!(err, S3Error::InvalidBucketName { .. }));
    }

    #[test]
    fn test_create_bucket_already_exists() {
        let (state, _tmp) = test_state();
        create_bucket(&state, "my-bucket").unwrap();
        let err = create_bucket(&state, "my-bucket").unwrap_err();
        assert!(matches!(err, S3Error::BucketAlreadyExists { .. }));
    }

    #[test]
    fn test_create_bucket_collides_with_stray_directory() {
        let (state, tmp) = test_state();
        std::fs::create_dir(tmp.path().join("my-bucket")).unwrap();

        let err = create_bucket(&state, "my-bucket").unwrap_err();
        assert!(matches!(err, S3Error::BucketAlreadyExists { .. }));
    }

    #[test]
    fn test_delete_bucket() {
        let (state, tmp) = test_state();
        create_bucket(&state, "my-bucket").unwrap();
        delete_bucket(&state, "my-bucket").unwrap();

        assert!(!tmp.path().join("my-bucket").exists());
        assert!(!state.catalogs.buckets().exists("my-bucket").unwrap());
    }

    #[test]
    fn test_delete_missing_bucket() {
        let (state, _tmp) = test_state();
        let err = delete_bucket(&state, "ghost").unwrap_err();
        assert!(matches!(err, S3Error::NoSuchBucket { .. }));
    }

    #[test]
    fn test_recreate_after_delete() {
        let (state, _tmp) = test_state();
        create_bucket(&state, "my-bucket").unwrap();
        delete_bucket(&state, "my-bucket").unwrap();
        create_bucket(&state, "my-bucket").unwrap();

        let record = state.catalogs.buckets().get("my-bucket").unwrap().unwrap();
        assert_eq!(record.status, BucketStatus::Inactive);
    }

    #[test]
    fn test_list_buckets() {
        let (state, _tmp) = test_state();
        create_bucket(&state, "alpha").unwrap();
        create_bucket(&state, "beta").unwrap();

        let buckets = list_buckets(&state).unwrap();
        let names: Vec<&str> = buckets.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert!(buckets.iter().all(|r| r.status == BucketStatus::Inactive));
    }

    #[test]
    fn test_concurrent_creates_report_conflict_not_internal() {
        use std::sync::Arc;

        let (state, _tmp) = test_state();
        let state = Arc::new(state);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let state = Arc::clone(&state);
            handles.push(std::thread::spawn(move || create_bucket(&state, "my-bucket")));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Exactly one creation wins; every loser sees the conflict kind,
        // whether it lost at the existence check or at directory creation.
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for result in results {
            if let Err(err) = result {
                assert!(matches!(err, S3Error::BucketAlreadyExists { .. }));
            }
        }
    }

    #[test]
    fn test_require_bucket_divergence_is_internal() {
        let (state, tmp) = test_state();
        std::fs::create_dir(tmp.path().join("orphan-dir")).unwrap();

        let err = require_bucket(&state, "orphan-dir").unwrap_err();
        assert!(matches!(err, S3Error::InternalError(_)));
        let err = require_bucket(&state, "absent").unwrap_err();
        assert!(matches!(err, S3Error::NoSuchBucket { .. }));
    }
}
