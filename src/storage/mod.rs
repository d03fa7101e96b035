//! Object byte storage.

pub mod backend;
pub mod local;

pub use backend::StorageBackend;
pub use local::LocalBackend;
