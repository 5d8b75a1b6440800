//! Content-addressed blob storage with streaming compression
//!
//! One flat directory under the repository home; the key of a blob is the
//! lowercase hex of its content hash, the value is the zlib-compressed file
//! body. Blobs are write-once: an existing key is never rewritten.

use anyhow::{Context, Result};
use dashmap::DashMap;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::filelist::FileList;
use crate::repo;

/// zlib level applied to blob bodies
const COMPRESSION_LEVEL: u32 = 6;

/// Upper bound on keys remembered by the read-through cache
const CACHE_MAX_KEYS: usize = 16 * 1024;

/// Content-addressed store keyed by the hex of a file's content hash
pub struct BlobStore {
    root: PathBuf,
    blobs_dir: PathBuf,
    /// Keys known to exist on disk; purely an existence-probe shortcut
    present: DashMap<String, ()>,
}

impl BlobStore {
    /// Open the blob store for the repository at `root`
    pub fn open(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            blobs_dir: repo::blobs_dir(root),
            present: DashMap::new(),
        }
    }

    /// True if a blob with this key is already stored
    pub fn has(&self, key: &str) -> bool {
        if self.present.contains_key(key) {
            return true;
        }
        let exists = self.blobs_dir.join(key).exists();
        if exists {
            self.remember(key);
        }
        exists
    }

    /// Stream `reader` through the compressor into a new blob named `key`
    ///
    /// The body is written to a temporary sibling and renamed into place on
    /// success; on failure the temporary file is removed. Writing an
    /// existing key is a no-op.
    pub fn put_stream(&self, key: &str, reader: &mut impl Read) -> Result<()> {
        let blob_path = self.blobs_dir.join(key);
        if blob_path.exists() {
            self.remember(key);
            return Ok(());
        }

        let temp_path = self.blobs_dir.join(format!(".tmp-{}", key));
        let result = write_compressed(&temp_path, reader, &blob_path);
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result.with_context(|| format!("failed to write blob {}", key))?;

        self.remember(key);
        Ok(())
    }

    /// Ensure every file in the list has its content in the store
    ///
    /// Returns `(new, existing)` counts. Missing blobs are ingested from the
    /// files under the repository root, in file-list order.
    pub fn add_files(&self, list: &FileList) -> Result<(u64, u64)> {
        let mut new_blobs = 0u64;
        let mut existing = 0u64;

        for (rel_path, metadata) in list.iter() {
            let key = metadata.hash.to_hex();
            if self.has(&key) {
                existing += 1;
                continue;
            }

            let abs_path = self.root.join(rel_path);
            let file = File::open(&abs_path).with_context(|| {
                format!("failed to open {} for blob ingest", abs_path.display())
            })?;
            let mut reader = BufReader::new(file);
            self.put_stream(&key, &mut reader)?;
            new_blobs += 1;
        }

        tracing::debug!(new = new_blobs, existing, "blob ingest finished");
        Ok((new_blobs, existing))
    }

    fn remember(&self, key: &str) {
        if self.present.len() < CACHE_MAX_KEYS {
            self.present.insert(key.to_string(), ());
        }
    }
}

fn write_compressed(temp_path: &Path, reader: &mut impl Read, blob_path: &Path) -> Result<()> {
    let temp_file = File::create(temp_path)
        .with_context(|| format!("failed to create {}", temp_path.display()))?;

    let mut encoder = ZlibEncoder::new(temp_file, Compression::new(COMPRESSION_LEVEL));
    io::copy(reader, &mut encoder).context("failed to compress blob contents")?;
    let temp_file = encoder.finish().context("failed to finish compression")?;
    temp_file.sync_all().context("failed to sync blob")?;
    drop(temp_file);

    fs::rename(temp_path, blob_path)
        .with_context(|| format!("failed to rename into {}", blob_path.display()))?;
    Ok(())
}
