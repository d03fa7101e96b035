//! Storage backend trait.

use bytes::Bytes;

/// Byte storage for bucket directories and object files.
///
/// The catalog is the source of truth for metadata; the backend only moves
/// bytes. All methods are synchronous and blocking.
pub trait StorageBackend: Send + Sync {
    /// Create the directory backing `bucket`. Fails if it already exists.
    fn create_bucket_dir(&self, bucket: &str) -> anyhow::Result<()>;

    /// Remove the directory backing `bucket` and everything inside it.
    fn remove_bucket_dir(&self, bucket: &str) -> anyhow::Result<()>;

    /// Whether the directory backing `bucket` exists.
    fn bucket_dir_exists(&self, bucket: &str) -> bool;

    /// Write `data` as the full contents of the object file, atomically
    /// replacing any previous version. Returns the number of bytes stored.
    fn write_object(&self, bucket: &str, key: &str, data: &[u8]) -> anyhow::Result<u64>;

    /// Read the full contents of the object file. `None` if it is missing.
    fn read_object(&self, bucket: &str, key: &str) -> anyhow::Result<Option<Bytes>>;

    /// Remove the object file.
    fn remove_object(&self, bucket: &str, key: &str) -> anyhow::Result<()>;

    /// Whether the object file exists.
    fn object_exists(&self, bucket: &str, key: &str) -> bool;
}
