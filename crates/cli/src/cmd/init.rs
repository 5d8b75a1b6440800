//! Initialize a repository in the current directory

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;

    let home = abakus_core::repo::create(&cwd)?;

    println!(
        "{} Initialized abakus repository at {}",
        "✓".green(),
        home.display()
    );
    Ok(())
}
