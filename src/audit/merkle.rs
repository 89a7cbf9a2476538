//! Binary Merkle tree over `(path, content hash)` pairs

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Root hash of a file set
///
/// Pairs are sorted first, so the result does not depend on discovery order.
/// Leaves hash `"path:hash"`; parents hash the concatenated hex of their
/// children; an odd level pairs its last node with itself. The empty set
/// hashes the empty input.
pub fn merkle_root<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
    pairs.sort_unstable();

    let mut level: Vec<String> = pairs
        .iter()
        .map(|(path, hash)| sha256_hex(format!("{}:{}", path, hash).as_bytes()))
        .collect();

    if level.is_empty() {
        return sha256_hex(b"");
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                let mut hasher = Sha256::new();
                hasher.update(left.as_bytes());
                hasher.update(right.as_bytes());
                format!("{:x}", hasher.finalize())
            })
            .collect();
    }

    level.swap_remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_empty_set() {
        assert_eq!(merkle_root(std::iter::empty()), EMPTY_SHA256);
    }

    #[test]
    fn test_single_leaf_is_leaf_hash() {
        let root = merkle_root([("a.py", "abc")]);
        assert_eq!(root, sha256_hex(b"a.py:abc"));
    }

    #[test]
    fn test_odd_level_duplicates_last() {
        let a = sha256_hex(b"a:1");
        let b = sha256_hex(b"b:2");
        let c = sha256_hex(b"c:3");
        let ab = sha256_hex(format!("{}{}", a, b).as_bytes());
        let cc = sha256_hex(format!("{}{}", c, c).as_bytes());
        let expected = sha256_hex(format!("{}{}", ab, cc).as_bytes());
        assert_eq!(merkle_root([("c", "3"), ("a", "1"), ("b", "2")]), expected);
    }

    #[test]
    fn test_content_change_changes_root() {
        let before = merkle_root([("a.py", "1"), ("b.py", "2")]);
        let after = merkle_root([("a.py", "1"), ("b.py", "3")]);
        assert_ne!(before, after);
    }

    proptest! {
        #[test]
        fn proptest_root_ignores_discovery_order(
            files in prop::collection::btree_map("[a-z]{1,8}\\.py", "[0-9a-f]{8}", 0..24)
                .prop_flat_map(|m| {
                    let pairs: Vec<(String, String)> = m.into_iter().collect();
                    (Just(pairs.clone()), Just(pairs).prop_shuffle())
                })
        ) {
            let (sorted, shuffled) = files;
            let a = merkle_root(sorted.iter().map(|(p, h)| (p.as_str(), h.as_str())));
            let b = merkle_root(shuffled.iter().map(|(p, h)| (p.as_str(), h.as_str())));
            prop_assert_eq!(a, b);
        }
    }
}
