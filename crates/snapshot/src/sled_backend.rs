//! sled-backed snapshot storage
//!
//! One named tree per snapshot (`snapshot:<id>`) holding a JSON record per
//! file plus the reserved metadata record. Writes go through a single
//! atomic batch; a failed write drops the tree so no partial bucket stays
//! visible.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use abakus_core::{merkle_root, FileList, FileMetadata};

use crate::backend::Backend;
use crate::snapshot::{SnapshotMetadata, METADATA_KEY};

/// Tree managed internally by sled; never a snapshot bucket
const SLED_DEFAULT_TREE: &[u8] = b"__sled__default";

/// Snapshot backend over a sled database
pub struct SledBackend {
    db_path: PathBuf,
    db: sled::Db,
    bucket_re: Regex,
}

impl SledBackend {
    /// Open the snapshot database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        let db = sled::open(db_path).with_context(|| {
            format!("failed to open snapshot database at {}", db_path.display())
        })?;

        Ok(Self {
            db_path: db_path.to_path_buf(),
            db,
            bucket_re: Regex::new(r"^snapshot:(\d+)$").expect("bucket name pattern"),
        })
    }

    fn bucket_name(id: u64) -> String {
        format!("snapshot:{}", id)
    }

    fn bucket_exists(&self, name: &str) -> bool {
        self.db
            .tree_names()
            .iter()
            .any(|n| n.as_ref() == name.as_bytes())
    }
}

impl Backend for SledBackend {
    fn read_metadata(&self, metadata: &mut HashMap<u64, SnapshotMetadata>) -> Result<u64> {
        let mut latest = 0u64;

        for name in self.db.tree_names() {
            if name.as_ref() == SLED_DEFAULT_TREE {
                continue;
            }

            let id = std::str::from_utf8(&name)
                .ok()
                .and_then(|s| self.bucket_re.captures(s))
                .and_then(|caps| caps[1].parse::<u64>().ok())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "invalid bucket name '{}' in {}",
                        String::from_utf8_lossy(&name),
                        self.db_path.display()
                    )
                })?;

            let tree = self
                .db
                .open_tree(&name)
                .with_context(|| format!("failed to open bucket for snapshot {}", id))?;
            let raw = tree
                .get(METADATA_KEY)
                .with_context(|| format!("failed to read metadata for snapshot {}", id))?
                .ok_or_else(|| {
                    anyhow::anyhow!("snapshot {} has no {} record", id, METADATA_KEY)
                })?;

            let mut meta: SnapshotMetadata = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to decode metadata for snapshot {}", id))?;
            meta.id = id;

            latest = latest.max(id);
            metadata.insert(id, meta);
        }

        Ok(latest)
    }

    fn create_snapshot(&self, files: &FileList, id: u64) -> Result<SnapshotMetadata> {
        let name = Self::bucket_name(id);
        if self.bucket_exists(&name) {
            anyhow::bail!("snapshot bucket '{}' already exists", name);
        }

        let merkle = merkle_root(files)
            .ok_or_else(|| anyhow::anyhow!("an empty file list has no merkle root"))?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_secs() as i64;

        let mut batch = sled::Batch::default();
        let mut file_count = 0u64;
        let mut size = 0u64;
        for (path, md) in files.iter() {
            let encoded = serde_json::to_vec(md)
                .with_context(|| format!("failed to encode file record '{}'", path))?;
            batch.insert(path.as_bytes(), encoded);
            file_count += 1;
            size += md.size;
        }

        let meta = SnapshotMetadata {
            id,
            timestamp,
            merkle_root: merkle,
            file_count,
            size,
        };
        batch.insert(
            METADATA_KEY.as_bytes(),
            serde_json::to_vec(&meta).context("failed to encode snapshot metadata")?,
        );

        let tree = self
            .db
            .open_tree(name.as_bytes())
            .with_context(|| format!("failed to create bucket '{}'", name))?;

        let written = tree
            .apply_batch(batch)
            .map_err(anyhow::Error::from)
            .and_then(|()| self.db.flush().map(|_| ()).map_err(anyhow::Error::from));

        if let Err(e) = written {
            // a failed write must not leave the bucket visible
            let _ = self.db.drop_tree(name.as_bytes());
            return Err(e).with_context(|| format!("failed to write bucket '{}'", name));
        }

        tracing::info!(id, files = file_count, size, "snapshot written");
        Ok(meta)
    }

    fn get_snapshot_files(&self, id: u64) -> Result<FileList> {
        let name = Self::bucket_name(id);
        if !self.bucket_exists(&name) {
            anyhow::bail!("no snapshot with id {}", id);
        }

        let tree = self
            .db
            .open_tree(name.as_bytes())
            .with_context(|| format!("failed to open bucket for snapshot {}", id))?;

        let mut list = FileList::new();
        for item in tree.iter() {
            let (key, value) =
                item.with_context(|| format!("failed to scan bucket for snapshot {}", id))?;
            if key.as_ref() == METADATA_KEY.as_bytes() {
                continue;
            }

            let path = std::str::from_utf8(&key)
                .with_context(|| format!("non-utf8 path key in snapshot {}", id))?
                .to_string();
            let md: FileMetadata = serde_json::from_slice(&value).with_context(|| {
                format!("failed to decode file record '{}' in snapshot {}", path, id)
            })?;
            list.insert(path, md);
        }

        Ok(list)
    }

    fn close(&self) -> Result<()> {
        self.db.flush().context("failed to flush snapshot database")?;
        Ok(())
    }
}
