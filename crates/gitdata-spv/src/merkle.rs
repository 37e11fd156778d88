//! Merkle inclusion path evaluation.

use gitdata_primitives::chainhash::Hash;
use gitdata_primitives::hash::sha256d;
use serde::{Deserialize, Serialize};

/// Which side of the pair a sibling hash occupies when folding a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Sibling is the left child; the running hash is the right.
    Left,
    /// Sibling is the right child; the running hash is the left.
    Right,
}

/// A single step of a merkle inclusion path: the sibling hash at one
/// tree level and the side it sits on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleNode {
    /// Sibling hash at this level.
    pub hash: Hash,
    /// Side of the pair the sibling occupies.
    pub position: Position,
}

/// Compute the merkle parent of two child hashes.
///
/// The hashes are in internal (little-endian) byte order. They are
/// concatenated directly (no reversal), then double-SHA256'd.
pub fn merkle_parent(left: &Hash, right: &Hash) -> Hash {
    let mut concatenated = [0u8; 64];
    concatenated[..32].copy_from_slice(left.as_bytes());
    concatenated[32..].copy_from_slice(right.as_bytes());
    Hash::new(sha256d(&concatenated))
}

/// Fold a merkle path upward from a leaf and compare the result against
/// an expected root.
///
/// Each step pairs the running hash with the sibling, placing the
/// sibling on the side its position names. An empty path verifies only
/// when the leaf already equals the root, the single-transaction case.
pub fn verify_merkle_path(leaf: &Hash, path: &[MerkleNode], expected_root: &Hash) -> bool {
    let mut acc = *leaf;
    for node in path {
        acc = match node.position {
            Position::Left => merkle_parent(&node.hash, &acc),
            Position::Right => merkle_parent(&acc, &node.hash),
        };
    }
    acc == *expected_root
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitdata_primitives::chainhash::sha256d_hash;

    #[test]
    fn test_merkle_parent_known_pair() {
        // Sibling txids and their parent from a production block.
        let left =
            Hash::from_hex("d6c79a6ef05572f0cb8e9a450c561fc40b0a8a7d48faad95e20d93ddeb08c231")
                .unwrap();
        let right =
            Hash::from_hex("b1ed931b79056438b990d8981ba46fae97e5574b142445a74a44b978af284f98")
                .unwrap();
        let parent = merkle_parent(&left, &right);
        assert_eq!(
            parent.to_string(),
            "b0d537b3ee52e472507f453df3d69561720346118a5a8c4d85ca0de73bc792be"
        );
    }

    #[test]
    fn test_empty_path_requires_leaf_equals_root() {
        let leaf = sha256d_hash(b"only transaction");
        assert!(verify_merkle_path(&leaf, &[], &leaf));
        let other = sha256d_hash(b"different");
        assert!(!verify_merkle_path(&leaf, &[], &other));
    }

    /// Build a four-leaf tree by hand and check each leaf's path,
    /// exercising both sibling positions at both levels.
    #[test]
    fn test_four_leaf_tree_paths() {
        let leaves: Vec<Hash> = [b"a" as &[u8], b"b", b"c", b"d"]
            .iter()
            .map(|d| sha256d_hash(d))
            .collect();
        let ab = merkle_parent(&leaves[0], &leaves[1]);
        let cd = merkle_parent(&leaves[2], &leaves[3]);
        let root = merkle_parent(&ab, &cd);

        // Leaf 0 pairs right with leaf 1, then right with cd.
        let path0 = vec![
            MerkleNode { hash: leaves[1], position: Position::Right },
            MerkleNode { hash: cd, position: Position::Right },
        ];
        assert!(verify_merkle_path(&leaves[0], &path0, &root));

        // Leaf 3 pairs left with leaf 2, then left with ab.
        let path3 = vec![
            MerkleNode { hash: leaves[2], position: Position::Left },
            MerkleNode { hash: ab, position: Position::Left },
        ];
        assert!(verify_merkle_path(&leaves[3], &path3, &root));

        // Swapping a step's side breaks the fold.
        let mut flipped = path0.clone();
        flipped[0].position = Position::Left;
        assert!(!verify_merkle_path(&leaves[0], &flipped, &root));

        // A tampered sibling breaks the fold.
        let mut tampered = path3.clone();
        tampered[1].hash = sha256d_hash(b"bogus");
        assert!(!verify_merkle_path(&leaves[3], &tampered, &root));

        // The right path for the wrong leaf fails.
        assert!(!verify_merkle_path(&leaves[1], &path0, &root));
    }

    #[test]
    fn test_position_serde_lowercase() {
        let node = MerkleNode {
            hash: sha256d_hash(b"sibling"),
            position: Position::Right,
        };
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains(r#""position":"right""#));
        let back: MerkleNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);

        let left: Position = serde_json::from_str(r#""left""#).unwrap();
        assert_eq!(left, Position::Left);
        assert!(serde_json::from_str::<Position>(r#""Left""#).is_err());
    }
}
