//! In-memory snapshot index and creation orchestration

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use abakus_core::{repo, FileList};

use crate::backend::Backend;
use crate::sled_backend::SledBackend;
use crate::snapshot::{Snapshot, SnapshotMetadata};

/// Front door to the snapshot subsystem
///
/// Owns the backend for its lifetime, keeps every snapshot's metadata in
/// memory, and issues monotonically increasing ids starting at 1.
pub struct Store {
    backend: Box<dyn Backend>,
    metadata: HashMap<u64, SnapshotMetadata>,
    latest: u64,
}

impl Store {
    /// Open the store for the repository at `root`
    pub fn open(root: &Path) -> Result<Self> {
        let db_path = repo::snapshots_db_path(root);
        let backend = SledBackend::open(&db_path)?;

        let mut metadata = HashMap::new();
        let latest = backend
            .read_metadata(&mut metadata)
            .context("failed to read snapshot metadata")?;

        Ok(Self {
            backend: Box::new(backend),
            metadata,
            latest,
        })
    }

    /// Record the next snapshot from `files`
    ///
    /// On success the new metadata is installed in the index and `latest`
    /// advances; on failure both are left unchanged.
    pub fn create_snapshot(&mut self, files: &FileList) -> Result<SnapshotMetadata> {
        if files.is_empty() {
            anyhow::bail!("refusing to create a snapshot of an empty file list");
        }

        let id = self.latest + 1;
        let meta = self.backend.create_snapshot(files, id)?;

        self.metadata.insert(id, meta.clone());
        self.latest = id;
        Ok(meta)
    }

    /// Fetch the snapshot with the given id
    pub fn get_snapshot(&self, id: u64) -> Result<Snapshot> {
        let files = self.backend.get_snapshot_files(id)?;

        // a bucket without an indexed header is an inconsistency
        let metadata = self
            .metadata
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no snapshot metadata with id {}", id))?;

        Ok(Snapshot { metadata, files })
    }

    /// Fetch the most recently created snapshot
    pub fn get_latest_snapshot(&self) -> Result<Snapshot> {
        self.get_snapshot(self.latest)
    }

    /// Id of the most recently created snapshot; 0 when the repository has
    /// no snapshots
    pub fn get_latest_id(&self) -> u64 {
        self.latest
    }

    /// Metadata of every snapshot, in no particular order; callers sort by
    /// id when presenting
    pub fn all_metadata(&self) -> Vec<SnapshotMetadata> {
        self.metadata.values().cloned().collect()
    }

    /// Flush and release the backend
    pub fn close(self) -> Result<()> {
        self.backend.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abakus_core::{hash_bytes, FileMetadata};

    fn sample_list(entries: &[(&str, &[u8])]) -> FileList {
        let mut list = FileList::new();
        for (path, contents) in entries {
            list.insert(
                *path,
                FileMetadata {
                    hash: hash_bytes(contents),
                    size: contents.len() as u64,
                    mode: 0o100644,
                    mod_time: 0,
                },
            );
        }
        list
    }

    fn scratch_repo() -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        repo::create(temp_dir.path()).unwrap();
        temp_dir
    }

    #[test]
    fn test_open_empty_repository() -> Result<()> {
        let temp_dir = scratch_repo();
        let store = Store::open(temp_dir.path())?;

        assert_eq!(store.get_latest_id(), 0);
        assert!(store.all_metadata().is_empty());
        store.close()
    }

    #[test]
    fn test_ids_are_sequential_from_one() -> Result<()> {
        let temp_dir = scratch_repo();
        let mut store = Store::open(temp_dir.path())?;

        for i in 1..=3u64 {
            let list = sample_list(&[("a.txt", format!("rev {}", i).as_bytes())]);
            let meta = store.create_snapshot(&list)?;
            assert_eq!(meta.id, i);
        }

        let mut ids: Vec<u64> = store.all_metadata().iter().map(|m| m.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
        store.close()
    }

    #[test]
    fn test_latest_persists_across_reopen() -> Result<()> {
        let temp_dir = scratch_repo();

        {
            let mut store = Store::open(temp_dir.path())?;
            store.create_snapshot(&sample_list(&[("a", b"1")]))?;
            store.create_snapshot(&sample_list(&[("a", b"2")]))?;
            store.close()?;
        }

        let mut store = Store::open(temp_dir.path())?;
        assert_eq!(store.get_latest_id(), 2);

        let meta = store.create_snapshot(&sample_list(&[("a", b"3")]))?;
        assert_eq!(meta.id, 3);
        store.close()
    }

    #[test]
    fn test_empty_file_list_is_rejected() -> Result<()> {
        let temp_dir = scratch_repo();
        let mut store = Store::open(temp_dir.path())?;

        let result = store.create_snapshot(&FileList::new());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty file list"));

        // neither the index nor latest may have moved
        assert_eq!(store.get_latest_id(), 0);
        assert!(store.all_metadata().is_empty());
        store.close()
    }

    #[test]
    fn test_get_snapshot_roundtrip() -> Result<()> {
        let temp_dir = scratch_repo();
        let mut store = Store::open(temp_dir.path())?;

        let list = sample_list(&[("a.txt", b"alpha"), ("b.txt", b"beta")]);
        let meta = store.create_snapshot(&list)?;

        let snapshot = store.get_snapshot(meta.id)?;
        assert_eq!(snapshot.metadata, meta);
        assert_eq!(snapshot.files.len(), 2);
        assert_eq!(
            snapshot.files.get("a.txt").unwrap().hash,
            hash_bytes(b"alpha")
        );
        store.close()
    }

    #[test]
    fn test_unknown_ids_fail() -> Result<()> {
        let temp_dir = scratch_repo();
        let mut store = Store::open(temp_dir.path())?;
        store.create_snapshot(&sample_list(&[("a", b"1")]))?;

        assert!(store.get_snapshot(0).is_err());
        assert!(store.get_snapshot(2).is_err());
        store.close()
    }

    #[test]
    fn test_get_latest_snapshot() -> Result<()> {
        let temp_dir = scratch_repo();
        let mut store = Store::open(temp_dir.path())?;

        store.create_snapshot(&sample_list(&[("a", b"old")]))?;
        store.create_snapshot(&sample_list(&[("a", b"new")]))?;

        let latest = store.get_latest_snapshot()?;
        assert_eq!(latest.metadata.id, 2);
        assert_eq!(latest.files.get("a").unwrap().hash, hash_bytes(b"new"));
        store.close()
    }

    #[test]
    fn test_open_fails_on_foreign_bucket() -> Result<()> {
        let temp_dir = scratch_repo();

        {
            let db = sled::open(repo::snapshots_db_path(temp_dir.path()))?;
            db.open_tree(b"junk")?;
            db.flush()?;
        }

        assert!(Store::open(temp_dir.path()).is_err());
        Ok(())
    }
}
