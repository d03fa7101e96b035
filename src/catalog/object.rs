//! Per-bucket object catalog.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::catalog::table::{Record, Table};

/// Filename of the per-bucket object catalog. Reserved: not a valid object
/// key at the bucket root.
pub const CATALOG_FILE: &str = "objects.csv";

/// One row of an object catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    /// Object key, unique within the bucket. May contain `/` separators.
    pub key: String,
    /// Size of the stored bytes.
    pub size: u64,
    /// Recorded content type; empty means unknown.
    pub content_type: String,
    /// Last modification timestamp, ISO-8601 UTC.
    pub last_modified: String,
}

impl Record for ObjectRecord {
    const HEADER: &'static [&'static str] = &["ObjectName", "Size", "ContentType", "LastModified"];

    fn key(&self) -> &str {
        &self.key
    }

    fn encode(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.size.to_string(),
            self.content_type.clone(),
            self.last_modified.clone(),
        ]
    }

    fn decode(fields: &[String]) -> anyhow::Result<Self> {
        anyhow::ensure!(fields.len() == 4, "expected 4 fields, got {}", fields.len());
        Ok(ObjectRecord {
            key: fields[0].clone(),
            size: fields[1]
                .parse()
                .map_err(|e| anyhow::anyhow!("bad object size {:?}: {e}", fields[1]))?,
            content_type: fields[2].clone(),
            last_modified: fields[3].clone(),
        })
    }
}

/// Object catalog for a single bucket, backed by `<bucket>/objects.csv`.
///
/// Also carries the bucket's update lock: object add/remove and the
/// subsequent bucket-status recomputation run under one guard, so the bucket
/// catalog never shows a status older than a completed object mutation.
pub struct ObjectCatalog {
    table: Table<ObjectRecord>,
    update_lock: Mutex<()>,
}

impl ObjectCatalog {
    /// Open (or create) the catalog inside `bucket_dir`.
    pub fn open(bucket_dir: &Path) -> anyhow::Result<Self> {
        Ok(ObjectCatalog {
            table: Table::open(bucket_dir.join(CATALOG_FILE))?,
            update_lock: Mutex::new(()),
        })
    }

    /// Take the bucket's update lock. Held across an object mutation and the
    /// bucket-status recomputation that follows it.
    pub fn lock_updates(&self) -> MutexGuard<'_, ()> {
        self.update_lock.lock().expect("mutex poisoned")
    }

    /// Insert or replace the record for `key`.
    pub fn put_object(
        &self,
        key: &str,
        content_type: &str,
        size: u64,
        now: &str,
    ) -> anyhow::Result<()> {
        self.table.upsert(ObjectRecord {
            key: key.to_string(),
            size,
            content_type: content_type.to_string(),
            last_modified: now.to_string(),
        })
    }

    /// Remove the record for `key`. No-op if absent.
    pub fn remove_object(&self, key: &str) -> anyhow::Result<()> {
        self.table.delete(key)
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<ObjectRecord>> {
        self.table.get(key)
    }

    pub fn contains(&self, key: &str) -> anyhow::Result<bool> {
        self.table.exists(key)
    }

    pub fn is_empty(&self) -> anyhow::Result<bool> {
        self.table.is_empty()
    }

    pub fn list(&self) -> anyhow::Result<Vec<ObjectRecord>> {
        self.table.list()
    }
}
