//! Durable CSV metadata catalogs.
//!
//! The catalog is the source of truth for bucket and object metadata. One
//! [`bucket::BucketCatalog`] covers the whole service; each bucket gets its
//! own [`object::ObjectCatalog`], opened lazily and cached for the process
//! lifetime in a [`CatalogSet`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub mod bucket;
pub mod object;
pub mod table;

use bucket::BucketCatalog;
use object::ObjectCatalog;

/// The full set of catalogs for one storage root.
pub struct CatalogSet {
    root: PathBuf,
    buckets: BucketCatalog,
    objects: Mutex<HashMap<String, Arc<ObjectCatalog>>>,
}

impl CatalogSet {
    /// Open the catalogs under `root`, creating the root directory and the
    /// bucket catalog file if they do not exist.
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let buckets = BucketCatalog::open(&root)?;
        Ok(CatalogSet {
            root,
            buckets,
            objects: Mutex::new(HashMap::new()),
        })
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The service-wide bucket catalog.
    pub fn buckets(&self) -> &BucketCatalog {
        &self.buckets
    }

    /// The object catalog for `bucket`, opening it on first use. The caller
    /// is responsible for checking that the bucket itself exists.
    pub fn objects(&self, bucket: &str) -> anyhow::Result<Arc<ObjectCatalog>> {
        let mut registry = self.objects.lock().expect("mutex poisoned");
        if let Some(catalog) = registry.get(bucket) {
            return Ok(Arc::clone(catalog));
        }
        let catalog = Arc::new(ObjectCatalog::open(&self.root.join(bucket))?);
        registry.insert(bucket.to_string(), Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Drop the cached object-catalog handle for `bucket`. Called when the
    /// bucket is deleted so a future bucket of the same name starts fresh.
    pub fn evict(&self, bucket: &str) {
        self.objects.lock().expect("mutex poisoned").remove(bucket);
    }
}
