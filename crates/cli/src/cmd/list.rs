//! List snapshots in the repository

use anyhow::Result;

use abakus_snapshot::Store;

use crate::util;

pub fn run() -> Result<()> {
    let root = util::repo_root()?;
    let store = Store::open(&root)?;

    println!(
        "{:<6} {:<18} {:<10} {:>8} {:>10}",
        "ID", "TIME", "MERKLE", "FILES", "SIZE"
    );

    let mut all = store.all_metadata();
    all.sort_by_key(|meta| meta.id);

    for meta in &all {
        println!(
            "{:<6} {:<18} {:<10} {:>8} {:>10}",
            meta.id,
            util::format_relative_time(meta.timestamp),
            util::short_hex(&meta.merkle_root),
            meta.file_count,
            util::format_size(meta.size)
        );
    }

    store.close()
}
