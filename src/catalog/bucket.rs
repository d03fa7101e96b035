//! Service-wide bucket catalog.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::catalog::table::{Record, Table};

/// Filename of the bucket catalog at the storage root.
pub const BUCKETS_FILE: &str = "buckets.csv";

/// Derived bucket status: Active iff the bucket holds at least one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Active,
    Inactive,
}

impl BucketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BucketStatus::Active => "Active",
            BucketStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for BucketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(BucketStatus::Active),
            "Inactive" => Ok(BucketStatus::Inactive),
            other => anyhow::bail!("unknown bucket status {other:?}"),
        }
    }
}

/// One row of the bucket catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRecord {
    pub name: String,
    /// Creation timestamp, ISO-8601 UTC. Never changes after creation.
    pub creation_time: String,
    /// Updated when the derived status flips.
    pub last_modified: String,
    pub status: BucketStatus,
}

impl Record for BucketRecord {
    const HEADER: &'static [&'static str] = &["Name", "CreationTime", "LastModified", "Status"];

    fn key(&self) -> &str {
        &self.name
    }

    fn encode(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.creation_time.clone(),
            self.last_modified.clone(),
            self.status.to_string(),
        ]
    }

    fn decode(fields: &[String]) -> anyhow::Result<Self> {
        anyhow::ensure!(fields.len() == 4, "expected 4 fields, got {}", fields.len());
        Ok(BucketRecord {
            name: fields[0].clone(),
            creation_time: fields[1].clone(),
            last_modified: fields[2].clone(),
            status: fields[3].parse()?,
        })
    }
}

/// The service-wide bucket catalog, backed by `<root>/buckets.csv`.
pub struct BucketCatalog {
    root: PathBuf,
    table: Table<BucketRecord>,
}

impl BucketCatalog {
    /// Open (or create) the catalog at the storage root.
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        Ok(BucketCatalog {
            root: root.to_path_buf(),
            table: Table::open(root.join(BUCKETS_FILE))?,
        })
    }

    /// Record a newly created bucket. Status starts Inactive and
    /// creation equals last-modified. Fails if a row already exists;
    /// callers check first to report the conflict with its proper kind.
    pub fn add_bucket(&self, name: &str, now: &str) -> anyhow::Result<()> {
        if self.table.exists(name)? {
            anyhow::bail!("bucket {name:?} already has a catalog row");
        }
        self.table.upsert(BucketRecord {
            name: name.to_string(),
            creation_time: now.to_string(),
            last_modified: now.to_string(),
            status: BucketStatus::Inactive,
        })
    }

    /// Drop a bucket's row. No-op if absent.
    pub fn remove_bucket(&self, name: &str) -> anyhow::Result<()> {
        self.table.delete(name)
    }

    pub fn get(&self, name: &str) -> anyhow::Result<Option<BucketRecord>> {
        self.table.get(name)
    }

    pub fn exists(&self, name: &str) -> anyhow::Result<bool> {
        self.table.exists(name)
    }

    /// Recompute the derived status from `has_objects`. The row is rewritten
    /// (and last-modified bumped) only when the status actually flips.
    pub fn mark_status(&self, name: &str, has_objects: bool, now: &str) -> anyhow::Result<()> {
        let Some(mut record) = self.table.get(name)? else {
            anyhow::bail!("bucket {name:?} has no catalog row");
        };
        let desired = if has_objects {
            BucketStatus::Active
        } else {
            BucketStatus::Inactive
        };
        if record.status == desired {
            return Ok(());
        }
        record.status = desired;
        record.last_modified = now.to_string();
        self.table.upsert(record)
    }

    /// All buckets, skipping rows whose backing directory has gone missing.
    pub fn list_buckets(&self) -> anyhow::Result<Vec<BucketRecord>> {
        Ok(self
            .table
            .list()?
            .into_iter()
            .filter(|r| self.root.join(&r.name).is_dir())
            .collect())
    }
}
