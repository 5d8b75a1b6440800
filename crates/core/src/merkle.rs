//! Merkle aggregation over a file list
//!
//! The root commits to the exact (path, content-hash) set: one leaf per
//! file, taken in lexicographic path order, reduced pairwise until a single
//! digest remains.

use blake2::Digest;

use crate::filelist::FileList;
use crate::hash::{finalize, Blake2b256, ContentHash};

/// Compute the Merkle root of a file list
///
/// Returns `None` for an empty list: there is nothing to commit to, and
/// snapshot creation refuses empty lists for this reason.
pub fn merkle_root(list: &FileList) -> Option<ContentHash> {
    let mut level: Vec<ContentHash> = list
        .iter()
        .map(|(path, md)| leaf(path, &md.hash))
        .collect();

    if level.is_empty() {
        return None;
    }

    while level.len() > 1 {
        // Odd levels duplicate their final element
        if level.len() % 2 == 1 {
            if let Some(&last) = level.last() {
                level.push(last);
            }
        }
        level = level
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    Some(level[0])
}

/// Leaf digest: BLAKE2b-256 of the UTF-8 path immediately followed by the
/// file's content hash, with no separator
fn leaf(path: &str, hash: &ContentHash) -> ContentHash {
    let mut hasher = Blake2b256::new();
    hasher.update(path.as_bytes());
    hasher.update(hash.as_bytes());
    finalize(hasher)
}

fn hash_pair(a: &ContentHash, b: &ContentHash) -> ContentHash {
    let mut hasher = Blake2b256::new();
    hasher.update(a.as_bytes());
    hasher.update(b.as_bytes());
    finalize(hasher)
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

    fn list(entries: &[(&str, &[u8])]) -> FileList {
        let mut fl = FileList::new();
        for (path, contents) in entries {
            fl.insert(*path, entry(contents, 0o644, 0));
        }
        fl
    }

    #[test]
    fn test_empty_list_has_no_root() {
        assert!(merkle_root(&FileList::new()).is_none());
    }

    #[test]
    fn test_single_entry_root_is_its_leaf() {
        let fl = list(&[("hello.txt", b"hi\n")]);

        let content_hash = hash_bytes(b"hi\n");
        let mut concat = b"hello.txt".to_vec();
        concat.extend_from_slice(content_hash.as_bytes());

        assert_eq!(merkle_root(&fl), Some(hash_bytes(&concat)));
    }

    #[test]
    fn test_two_entries_reduce_to_pair_hash() {
        let fl = list(&[("a", b"1"), ("b", b"2")]);

        let leaf_a = leaf("a", &hash_bytes(b"1"));
        let leaf_b = leaf("b", &hash_bytes(b"2"));

        assert_eq!(merkle_root(&fl), Some(hash_pair(&leaf_a, &leaf_b)));
    }

    #[test]
    fn test_odd_count_duplicates_final_leaf() {
        let fl = list(&[("a", b"1"), ("b", b"2"), ("c", b"3")]);

        let leaf_a = leaf("a", &hash_bytes(b"1"));
        let leaf_b = leaf("b", &hash_bytes(b"2"));
        let leaf_c = leaf("c", &hash_bytes(b"3"));
        let expected = hash_pair(
            &hash_pair(&leaf_a, &leaf_b),
            &hash_pair(&leaf_c, &leaf_c),
        );

        assert_eq!(merkle_root(&fl), Some(expected));
    }

    #[test]
    fn test_root_is_deterministic() {
        let fl1 = list(&[("x", b"one"), ("y", b"two"), ("z", b"three")]);
        let fl2 = list(&[("z", b"three"), ("x", b"one"), ("y", b"two")]);

        assert_eq!(merkle_root(&fl1), merkle_root(&fl2));
    }

    #[test]
    fn test_root_ignores_size_mode_and_mod_time() {
        let mut fl1 = FileList::new();
        let mut fl2 = FileList::new();
        fl1.insert(
            "a",
            FileMetadata {
                hash: hash_bytes(b"data"),
                size: 4,
                mode: 0o644,
                mod_time: 100,
            },
        );
        fl2.insert(
            "a",
            FileMetadata {
                hash: hash_bytes(b"data"),
                size: 9999,
                mode: 0o755,
                mod_time: 999,
            },
        );

        assert_eq!(merkle_root(&fl1), merkle_root(&fl2));
    }

    #[test]
    fn test_path_change_changes_root() {
        let fl1 = list(&[("hello.txt", b"hi\n")]);
        let fl2 = list(&[("greet.txt", b"hi\n")]);

        assert_ne!(merkle_root(&fl1), merkle_root(&fl2));
    }

    #[test]
    fn test_content_change_changes_root() {
        let fl1 = list(&[("a", b"1")]);
        let fl2 = list(&[("a", b"2")]);

        assert_ne!(merkle_root(&fl1), merkle_root(&fl2));
    }
}
