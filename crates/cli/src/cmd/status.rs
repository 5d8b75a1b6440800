//! Show changes to the working directory

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use abakus_core::{diff, FileList};
use abakus_snapshot::Store;

use crate::util;

pub fn run() -> Result<()> {
    let root = util::repo_root()?;
    let store = Store::open(&root)?;

    let latest_files = if store.get_latest_id() == 0 {
        println!("No Snapshots");
        FileList::new()
    } else {
        let latest = store.get_latest_snapshot()?;
        println!(
            "Latest snapshot {} ({})",
            latest.metadata.id,
            util::format_relative_time(latest.metadata.timestamp)
        );
        latest.files
    };

    let workdir = FileList::from_root(&root).context("failed to build file list")?;
    store.close()?;

    let changes = diff(&latest_files, &workdir);
    if changes.is_empty() {
        println!("No changes.");
        return Ok(());
    }

    for path in &changes.added {
        println!("{}", format!("added:       {}", path).green());
    }
    for path in &changes.modified {
        println!("{}", format!("modified:    {}", path).red());
    }
    for path in &changes.deleted {
        println!("{}", format!("deleted:     {}", path).red());
    }
    Ok(())
}
