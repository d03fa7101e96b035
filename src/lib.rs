//! triple-s library — simple S3-style object storage engine.
//!
//! This crate provides the core components for running a small
//! S3-style storage server: a durable CSV metadata catalog, a local
//! filesystem storage backend, and the bucket/object operations that
//! keep the two consistent under concurrent access.

use std::sync::Arc;

pub mod catalog;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod ops;
pub mod server;
pub mod storage;
pub mod validation;
pub mod xml;

use crate::catalog::CatalogSet;
use crate::config::Config;
use crate::storage::backend::StorageBackend;

/// Shared application state passed to all handlers via `axum::extract::State`.
///
/// This is the explicit service context: every operation receives it instead
/// of reaching for process-wide globals.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Bucket catalog plus the per-bucket object-catalog registry.
    pub catalogs: CatalogSet,
    /// Object storage backend (local filesystem).
    pub storage: Arc<dyn StorageBackend>,
}

impl AppState {
    /// Open the catalogs and storage backend under the configured root,
    /// creating the root directory if it does not exist.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let catalogs = CatalogSet::open(&config.storage.root)?;
        let storage: Arc<dyn StorageBackend> =
            Arc::new(storage::LocalBackend::new(&config.storage.root));
        Ok(AppState {
            config,
            catalogs,
            storage,
        })
    }
}
