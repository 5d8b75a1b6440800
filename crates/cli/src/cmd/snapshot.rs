//! Record a snapshot of the working tree

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use abakus_core::{repo, BlobStore, FileList};
use abakus_snapshot::Store;

use crate::locks::RepoLock;
use crate::util;

pub fn run() -> Result<()> {
    let root = util::repo_root()?;
    let _lock = RepoLock::acquire(&repo::home_dir(&root))?;

    let files = FileList::from_root(&root).context("failed to build file list")?;
    if files.is_empty() {
        anyhow::bail!("working tree has no files to snapshot");
    }

    // blob ingest must complete before the database transaction begins
    let blobs = BlobStore::open(&root);
    let (new_blobs, existing) = blobs.add_files(&files).context("failed to ingest blobs")?;

    let mut store = Store::open(&root)?;
    let meta = store.create_snapshot(&files)?;
    store.close()?;

    println!("{} Snapshot {} recorded", "✓".green(), meta.id);
    println!("  Files:   {}", meta.file_count);
    println!("  Size:    {}", util::format_size(meta.size));
    println!("  Merkle:  {}", util::short_hex(&meta.merkle_root));
    println!("  Blobs:   {} new, {} deduplicated", new_blobs, existing);
    Ok(())
}
