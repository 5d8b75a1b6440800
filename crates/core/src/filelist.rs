//! File-list construction via filtered tree traversal

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::exclude::{ExcludeRules, ExcludeStack};
use crate::hash::{hash_file, ContentHash};
use crate::repo;

/// Metadata recorded for one regular file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// BLAKE2b-256 digest of the file contents
    pub hash: ContentHash,
    /// Size in bytes
    pub size: u64,
    /// Unix mode bits
    pub mode: u32,
    /// Modification time (Unix seconds); informational only, never persisted
    #[serde(skip)]
    pub mod_time: u64,
}

/// Ordered mapping from repository-relative path to file metadata
///
/// Iteration order is lexicographic by path. Merkle aggregation depends on
/// this ordering, so it must hold for lists built from disk and lists read
/// back from the snapshot database alike.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    files: BTreeMap<String, FileMetadata>,
}

impl FileList {
    /// Create an empty file list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the list of all non-excluded files under the repository root
    ///
    /// The home directory is always excluded via a synthetic anchored rule
    /// pushed before traversal begins.
    pub fn from_root(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", root.display()))?;

        let mut home_rule = ExcludeRules::new(&root);
        home_rule.add(&format!("/{}", repo::HOME_DIR))?;

        let mut stack = ExcludeStack::new();
        stack.push(home_rule);

        let mut list = FileList::new();
        walk_dir(&root, &root, &mut stack, &mut list)?;
        Ok(list)
    }

    /// Map the relative path to the given metadata
    pub fn insert(&mut self, rel_path: impl Into<String>, metadata: FileMetadata) {
        self.files.insert(rel_path.into(), metadata);
    }

    /// Look up the metadata for a relative path
    pub fn get(&self, rel_path: &str) -> Option<&FileMetadata> {
        self.files.get(rel_path)
    }

    /// Number of files in the list
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if the list has no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over (path, metadata) pairs in lexicographic path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileMetadata)> {
        self.files.iter().map(|(path, md)| (path.as_str(), md))
    }

    /// Iterate over paths in lexicographic order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|path| path.as_str())
    }

    /// Sum of all file sizes in bytes
    pub fn total_size(&self) -> u64 {
        self.files.values().map(|md| md.size).sum()
    }
}

/// Descend into `dir`, keeping its rule frame on the stack for the duration
/// of the visit. The frame is popped on every exit path, including error
/// propagation.
fn walk_dir(
    root: &Path,
    dir: &Path,
    stack: &mut ExcludeStack,
    list: &mut FileList,
) -> Result<()> {
    let rules = ExcludeRules::load(dir)?;
    stack.push(rules);
    let result = walk_entries(root, dir, stack, list);
    stack.pop();
    result
}

fn walk_entries(
    root: &Path,
    dir: &Path,
    stack: &mut ExcludeStack,
    list: &mut FileList,
) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to list {}", dir.display()))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let abs_path = entry.path();
        if stack.is_excluded(&abs_path.to_string_lossy()) {
            tracing::debug!(path = %abs_path.display(), "excluded by rule");
            continue;
        }

        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat {}", abs_path.display()))?;

        if file_type.is_dir() {
            walk_dir(root, &abs_path, stack, list)?;
        } else if file_type.is_file() {
            let metadata = entry
                .metadata()
                .with_context(|| format!("failed to stat {}", abs_path.display()))?;

            let rel_path = relative_path(root, &abs_path)?;
            list.insert(
                rel_path,
                FileMetadata {
                    hash: hash_file(&abs_path)?,
                    size: metadata.len(),
                    mode: file_mode(&metadata),
                    mod_time: mod_time_secs(&metadata),
                },
            );
        } else {
            // symlinks, sockets, devices and FIFOs are not tracked
            tracing::debug!(path = %abs_path.display(), "skipping non-regular entry");
        }
    }

    Ok(())
}

fn relative_path(root: &Path, abs: &Path) -> Result<String> {
    let rel = abs
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", abs.display(), root.display()))?;
    Ok(rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    0o644
}

fn mod_time_secs(metadata: &fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
