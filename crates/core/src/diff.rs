//! Comparison of two file lists

use crate::filelist::FileList;

/// Paths that differ between two file lists
///
/// Each set follows the iteration order of the list it was derived from
/// (lexicographic by path).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListDiff {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl FileListDiff {
    /// True if the two lists were identical
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Compare `old` and `new`
///
/// A path present in both counts as modified when its content hash or its
/// mode differs; size and modification time are never consulted.
pub fn diff(old: &FileList, new: &FileList) -> FileListDiff {
    let mut result = FileListDiff::default();

    for path in old.paths() {
        if new.get(path).is_none() {
            result.deleted.push(path.to_string());
        }
    }

    for (path, new_md) in new.iter() {
        match old.get(path) {
            None => result.added.push(path.to_string()),
            Some(old_md) => {
                if old_md.hash != new_md.hash || old_md.mode != new_md.mode {
                    result.modified.push(path.to_string());
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filelist::FileMetadata;
    use crate::hash::hash_bytes;

    fn entry(contents: &[u8], mode: u32, mod_time: u64) -> FileMetadata {
        FileMetadata {
            hash: hash_bytes(contents),
            size: contents.len() as u64,
            mode,
            mod_time,
        }
    }

    fn list(entries: &[(&str, FileMetadata)]) -> FileList {
        let mut fl = FileList::new();
        for (path, md) in entries {
            fl.insert(*path, md.clone());
        }
        fl
    }

    #[test]
    fn test_identical_lists_have_empty_diff() {
        let fl = list(&[
            ("a.txt", entry(b"a", 0o644, 10)),
            ("b.txt", entry(b"b", 0o644, 20)),
        ]);

        let result = diff(&fl, &fl);
        assert!(result.is_empty());
    }

    #[test]
    fn test_added_and_deleted() {
        let old = list(&[("gone.txt", entry(b"x", 0o644, 1))]);
        let new = list(&[("fresh.txt", entry(b"y", 0o644, 2))]);

        let result = diff(&old, &new);
        assert_eq!(result.added, vec!["fresh.txt"]);
        assert_eq!(result.deleted, vec!["gone.txt"]);
        assert!(result.modified.is_empty());
    }

    #[test]
    fn test_deleted_mirrors_added() {
        let f = list(&[
            ("a", entry(b"1", 0o644, 1)),
            ("b", entry(b"2", 0o644, 1)),
        ]);
        let g = list(&[
            ("b", entry(b"2", 0o644, 1)),
            ("c", entry(b"3", 0o644, 1)),
        ]);

        assert_eq!(diff(&f, &g).deleted, diff(&g, &f).added);
        assert_eq!(diff(&f, &g).added, diff(&g, &f).deleted);
    }

    #[test]
    fn test_hash_change_is_modified() {
        let old = list(&[("a", entry(b"before", 0o644, 1))]);
        let new = list(&[("a", entry(b"after", 0o644, 1))]);

        let result = diff(&old, &new);
        assert_eq!(result.modified, vec!["a"]);
        assert!(result.added.is_empty());
        assert!(result.deleted.is_empty());
    }

    #[test]
    fn test_mode_change_is_modified() {
        let old = list(&[("a", entry(b"same", 0o644, 1))]);
        let new = list(&[("a", entry(b"same", 0o755, 1))]);

        assert_eq!(diff(&old, &new).modified, vec!["a"]);
    }

    #[test]
    fn test_mod_time_change_is_not_modified() {
        let old = list(&[("a", entry(b"same", 0o644, 100))]);
        let new = list(&[("a", entry(b"same", 0o644, 999))]);

        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn test_output_order_is_lexicographic() {
        let old = FileList::new();
        let mut new = FileList::new();
        for path in ["z", "a", "m"] {
            new.insert(path, entry(path.as_bytes(), 0o644, 1));
        }

        assert_eq!(diff(&old, &new).added, vec!["a", "m", "z"]);
    }
}
