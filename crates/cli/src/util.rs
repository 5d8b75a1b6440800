//! Shared helpers for CLI commands

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use abakus_core::ContentHash;

/// Resolve the repository root from the current directory
pub fn repo_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    abakus_core::repo::find_root(&cwd)
}

/// First eight hex characters of a digest
pub fn short_hex(hash: &ContentHash) -> String {
    hash.to_hex()[..8].to_string()
}

/// Format file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a Unix timestamp (seconds) as relative time ("2 hours ago")
pub fn format_relative_time(ts_secs: i64) -> String {
    if ts_secs < 0 {
        return "before the epoch".to_string();
    }

    let then = UNIX_EPOCH + std::time::Duration::from_secs(ts_secs as u64);
    if let Ok(elapsed) = SystemTime::now().duration_since(then) {
        let seconds = elapsed.as_secs();

        if seconds < 60 {
            format!("{} seconds ago", seconds)
        } else if seconds < 3600 {
            format!("{} minutes ago", seconds / 60)
        } else if seconds < 86400 {
            format!("{} hours ago", seconds / 3600)
        } else if seconds < 604800 {
            format!("{} days ago", seconds / 86400)
        } else {
            format!("{} weeks ago", seconds / 604800)
        }
    } else {
        "in the future".to_string()
    }
}
