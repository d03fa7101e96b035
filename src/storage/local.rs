//! Local filesystem storage backend.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;

use crate::storage::backend::StorageBackend;

/// Stores object bytes under `<root>/<bucket>/<key>`, nesting directories
/// for `/`-separated keys. Writes go through a temp file in the target
/// directory, fsync, then an atomic rename.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalBackend { root: root.into() }
    }

    fn bucket_path(&self, bucket: &str) -> anyhow::Result<PathBuf> {
        validate_path_component(bucket)?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> anyhow::Result<PathBuf> {
        let mut path = self.bucket_path(bucket)?;
        let relative = Path::new(key);
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                _ => anyhow::bail!("object key {key:?} escapes the bucket directory"),
            }
        }
        Ok(path)
    }
}

/// Reject names that could traverse outside the storage root.
fn validate_path_component(name: &str) -> anyhow::Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        anyhow::bail!("invalid path component: {name:?}");
    }
    Ok(())
}

impl StorageBackend for LocalBackend {
    fn create_bucket_dir(&self, bucket: &str) -> anyhow::Result<()> {
        std::fs::create_dir(self.bucket_path(bucket)?)?;
        Ok(())
    }

    fn remove_bucket_dir(&self, bucket: &str) -> anyhow::Result<()> {
        std::fs::remove_dir_all(self.bucket_path(bucket)?)?;
        Ok(())
    }

    fn bucket_dir_exists(&self, bucket: &str) -> bool {
        self.bucket_path(bucket).map(|p| p.is_dir()).unwrap_or(false)
    }

    fn write_object(&self, bucket: &str, key: &str, data: &[u8]) -> anyhow::Result<u64> {
        let path = self.object_path(bucket, key)?;
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("object path has no parent: {}", path.display()))?;
        std::fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(data)?;
        temp.flush()?;
        temp.as_file().sync_all()?;
        temp.persist(&path)?;
        Ok(data.len() as u64)
    }

    fn read_object(&self, bucket: &str, key: &str) -> anyhow::Result<Option<Bytes>> {
        let path = self.object_path(bucket, key)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_object(&self, bucket: &str, key: &str) -> anyhow::Result<()> {
        std::fs::remove_file(self.object_path(bucket, key)?)?;
        Ok(())
    }

    fn object_exists(&self, bucket: &str, key: &str) -> bool {
        self.object_path(bucket, key)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }
}
