//! Snapshot data structures

use abakus_core::{ContentHash, FileList};
use serde::{Deserialize, Serialize};

/// Reserved record key holding a snapshot's metadata inside its bucket
///
/// Never a valid file path, so it cannot collide with file records.
pub const METADATA_KEY: &str = "__abakus.metadata";

/// Per-snapshot header
///
/// The file list itself lives in the snapshot bucket; the store keeps all
/// headers in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Assigned by the store; derived from the bucket name on read, never
    /// serialized
    #[serde(skip)]
    pub id: u64,
    /// Creation time (Unix seconds)
    pub timestamp: i64,
    /// Merkle root over the snapshot's file list
    #[serde(rename = "merkle")]
    pub merkle_root: ContentHash,
    /// Number of files in the snapshot
    #[serde(rename = "files")]
    pub file_count: u64,
    /// Sum of contained file sizes in bytes
    pub size: u64,
}

/// A snapshot: its metadata plus the full file list
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    pub files: FileList,
}
