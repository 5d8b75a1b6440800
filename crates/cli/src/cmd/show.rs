//! Show the files recorded in a snapshot

use anyhow::Result;

use abakus_snapshot::Store;

use crate::util;

pub fn run(id: u64) -> Result<()> {
    let root = util::repo_root()?;
    let store = Store::open(&root)?;

    let snapshot = store.get_snapshot(id)?;

    println!("{:<40} {:<10} {:>10} {:>8}", "PATH", "HASH", "SIZE", "MODE");
    for (path, md) in snapshot.files.iter() {
        println!(
            "{:<40} {:<10} {:>10} {:>8o}",
            path,
            util::short_hex(&md.hash),
            util::format_size(md.size),
            md.mode
        );
    }

    store.close()
}
