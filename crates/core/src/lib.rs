//! Abakus core - content-addressed snapshot primitives
//!
//! This crate provides the foundational layer of the snapshot engine:
//! - BLAKE2b-256 hashing
//! - Repository layout and root resolution
//! - Per-directory exclude rules
//! - File-list construction and diffing
//! - Merkle aggregation over a file list
//! - Blob storage with streaming compression

pub mod blob;
pub mod diff;
pub mod exclude;
pub mod filelist;
pub mod hash;
pub mod merkle;
pub mod repo;

// Re-export main types for convenience
pub use blob::BlobStore;
pub use diff::{diff, FileListDiff};
pub use filelist::{FileList, FileMetadata};
pub use hash::{hash_bytes, hash_file, ContentHash};
pub use merkle::merkle_root;

/// Common result type used throughout abakus-core
pub type Result<T> = anyhow::Result<T>;
