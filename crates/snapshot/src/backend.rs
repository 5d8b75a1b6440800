//! Storage contract for snapshot persistence

use std::collections::HashMap;

use abakus_core::FileList;

use crate::snapshot::SnapshotMetadata;
use crate::Result;

/// Capability set a snapshot storage mechanism must provide
///
/// A single embedded key-value implementation ships today; the contract is
/// kept this narrow so an alternate backend (a flat-file format, say) could
/// slot in without touching the store.
pub trait Backend {
    /// Scan every snapshot bucket into `metadata`, keyed by id, and return
    /// the highest id seen (0 if the database is empty)
    fn read_metadata(&self, metadata: &mut HashMap<u64, SnapshotMetadata>) -> Result<u64>;

    /// Write a new snapshot bucket for `id` holding the given file list plus
    /// its metadata record, all-or-nothing. Fails if the bucket exists.
    fn create_snapshot(&self, files: &FileList, id: u64) -> Result<SnapshotMetadata>;

    /// Read back the file list stored for `id`
    fn get_snapshot_files(&self, id: u64) -> Result<FileList>;

    /// Flush and release the database
    fn close(&self) -> Result<()>;
}
