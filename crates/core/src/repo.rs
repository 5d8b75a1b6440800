//! Repository layout and root resolution
//!
//! A repository is any directory containing the hidden home directory:
//!
//! ```text
//! <root>/.abakus/
//!   blobs/            content-addressed blob store
//!   snapshots.db      embedded snapshot database
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the abakus home directory under the repository root
pub const HOME_DIR: &str = ".abakus";

/// Name of the blob directory inside the home directory
pub const BLOBS_DIR: &str = "blobs";

/// Name of the snapshot database inside the home directory
pub const SNAPSHOTS_DB: &str = "snapshots.db";

/// Path to the home directory for the repository at `root`
pub fn home_dir(root: &Path) -> PathBuf {
    root.join(HOME_DIR)
}

/// Path to the blob directory for the repository at `root`
pub fn blobs_dir(root: &Path) -> PathBuf {
    root.join(HOME_DIR).join(BLOBS_DIR)
}

/// Path to the snapshot database for the repository at `root`
pub fn snapshots_db_path(root: &Path) -> PathBuf {
    root.join(HOME_DIR).join(SNAPSHOTS_DB)
}

/// Create a new abakus repository under `root`
///
/// Creates the home directory and the blob directory, then opens and closes
/// the snapshot database so it exists on disk. Fails if the home directory
/// is already present. Returns the home path.
pub fn create(root: &Path) -> Result<PathBuf> {
    let home = home_dir(root);

    if home.exists() {
        anyhow::bail!("abakus repository already exists at {}", home.display());
    }

    tracing::info!(home = %home.display(), "initializing abakus repository");

    create_dir(&home)?;
    create_dir(&blobs_dir(root))?;
    create_snapshots_db(root)?;

    Ok(home)
}

/// Resolve the repository root by walking up from `from` until a directory
/// containing the home directory is found
pub fn find_root(from: &Path) -> Result<PathBuf> {
    let start = from
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", from.display()))?;

    let mut current = start.clone();
    loop {
        if home_dir(&current).is_dir() {
            return Ok(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => anyhow::bail!(
                "not an abakus repository (no {} directory found above {})",
                HOME_DIR,
                start.display()
            ),
        }
    }
}

fn create_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        tracing::debug!(dir = %path.display(), "creating directory");
        fs::create_dir(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        set_dir_mode(path)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_dir_mode(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_dir_mode(_path: &Path) -> Result<()> {
    Ok(())
}

/// Open and close the snapshot database so an empty database exists on disk
fn create_snapshots_db(root: &Path) -> Result<()> {
    let db_path = snapshots_db_path(root);
    let db = sled::open(&db_path).with_context(|| {
        format!("failed to create snapshot database at {}", db_path.display())
    })?;
    db.flush()
        .with_context(|| format!("failed to flush snapshot database at {}", db_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_repository_layout() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path();

        let home = create(root)?;

        assert_eq!(home, root.join(".abakus"));
        assert!(home.is_dir());
        assert!(blobs_dir(root).is_dir());
        assert!(snapshots_db_path(root).exists());
        Ok(())
    }

    #[test]
    fn test_create_twice_fails() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path();

        create(root)?;
        let result = create(root);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("already exists"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_create_sets_directory_mode() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path();

        let home = create(root)?;
        let mode = fs::metadata(&home)?.permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        Ok(())
    }

    #[test]
    fn test_find_root_from_root_itself() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path();
        create(root)?;

        assert_eq!(find_root(root)?, root.canonicalize()?);
        Ok(())
    }

    #[test]
    fn test_find_root_from_nested_directory() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path();
        create(root)?;

        let nested = root.join("a/b/c");
        fs::create_dir_all(&nested)?;

        assert_eq!(find_root(&nested)?, root.canonicalize()?);
        Ok(())
    }

    #[test]
    fn test_find_root_outside_repository_fails() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;

        let result = find_root(temp_dir.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not an abakus repository"));
        Ok(())
    }

    #[test]
    fn test_path_computations() {
        let root = Path::new("/work/project");
        assert_eq!(home_dir(root), PathBuf::from("/work/project/.abakus"));
        assert_eq!(blobs_dir(root), PathBuf::from("/work/project/.abakus/blobs"));
        assert_eq!(
            snapshots_db_path(root),
            PathBuf::from("/work/project/.abakus/snapshots.db")
        );
    }
}
