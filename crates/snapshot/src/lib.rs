//! Snapshot metadata store and its embedded database backend
//!
//! This crate provides:
//! - Snapshot types (per-snapshot header plus file list)
//! - The storage contract snapshot backends implement
//! - The sled-backed implementation (one bucket per snapshot)
//! - The store: an in-memory index issuing monotonically increasing ids

pub mod backend;
pub mod sled_backend;
pub mod snapshot;
pub mod store;

// Re-exports
pub use backend::Backend;
pub use sled_backend::SledBackend;
pub use snapshot::{Snapshot, SnapshotMetadata, METADATA_KEY};
pub use store::Store;

/// Result type for snapshot operations
pub type Result<T> = anyhow::Result<T>;
