//! Headers index built from a local mirror of the block header chain.
//!
//! The mirror file is JSON in one of three shapes: an object with a
//! `headers` array, an object with a `byHash` map, or a bare array of
//! records. Whatever the shape, parsing produces the same immutable
//! [`HeadersIndex`]. An index is replaced wholesale when the mirror
//! changes, never mutated in place.

use std::collections::HashMap;
use std::path::Path;

use gitdata_primitives::chainhash::Hash;
use serde::{Deserialize, Serialize};

use crate::error::SpvError;

/// A single block header record from the headers mirror.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderRecord {
    /// Block hash.
    pub hash: Hash,
    /// Hash of the previous block.
    pub prev_hash: Hash,
    /// Merkle root committed by this header.
    pub merkle_root: Hash,
    /// Height of the block in the chain.
    pub height: u64,
}

/// Record shape used by the `byHash` map form, where the block hash is
/// the map key rather than a field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyedRecord {
    prev_hash: Hash,
    merkle_root: Hash,
    height: u64,
}

/// Wrapper document shape. `headers` and `byHash` are alternatives;
/// `bestHeight` and `tipHash` are optional and inferred when absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeadersDoc {
    best_height: Option<u64>,
    tip_hash: Option<String>,
    headers: Option<Vec<HeaderRecord>>,
    by_hash: Option<HashMap<String, KeyedRecord>>,
}

/// An immutable in-memory index of block headers, with lookups by hash
/// and by height plus the chain tip observed at load time.
#[derive(Debug)]
pub struct HeadersIndex {
    by_hash: HashMap<Hash, HeaderRecord>,
    by_height: HashMap<u64, Hash>,
    best_height: u64,
    tip_hash: Hash,
}

impl HeadersIndex {
    /// Build an index from parsed records.
    ///
    /// # Arguments
    /// * `records` - Header records; duplicates by hash keep the last one.
    /// * `best_height` - Explicit tip height, or `None` to infer the
    ///   maximum record height.
    /// * `tip_hash` - Explicit tip hash, or `None` to use the record at
    ///   the best height.
    ///
    /// # Returns
    /// The index, or `HeadersSourceMalformed` when `records` is empty.
    /// An empty mirror is indistinguishable from a corrupt one and
    /// verification must fail closed.
    pub fn from_records(
        records: Vec<HeaderRecord>,
        best_height: Option<u64>,
        tip_hash: Option<Hash>,
    ) -> Result<Self, SpvError> {
        if records.is_empty() {
            return Err(SpvError::HeadersSourceMalformed(
                "no header records".to_string(),
            ));
        }

        let mut by_hash = HashMap::with_capacity(records.len());
        let mut by_height = HashMap::with_capacity(records.len());
        let mut max_height = 0u64;
        for record in records {
            max_height = max_height.max(record.height);
            by_height.insert(record.height, record.hash);
            by_hash.insert(record.hash, record);
        }

        let best_height = best_height.unwrap_or(max_height);
        let tip_hash = match tip_hash {
            Some(hash) => hash,
            None => by_height.get(&best_height).copied().unwrap_or_default(),
        };

        Ok(HeadersIndex {
            by_hash,
            by_height,
            best_height,
            tip_hash,
        })
    }

    /// Look up a header record by block hash.
    pub fn header(&self, hash: &Hash) -> Option<&HeaderRecord> {
        self.by_hash.get(hash)
    }

    /// Look up a header record by height.
    pub fn header_at(&self, height: u64) -> Option<&HeaderRecord> {
        self.by_height.get(&height).and_then(|h| self.by_hash.get(h))
    }

    /// Height of the chain tip observed when the mirror was loaded.
    pub fn best_height(&self) -> u64 {
        self.best_height
    }

    /// Hash of the chain tip observed when the mirror was loaded.
    pub fn tip_hash(&self) -> Hash {
        self.tip_hash
    }

    /// Number of header records in the index.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// True when the index holds no records. `from_records` rejects the
    /// empty case, so this only reports true for hand-built indexes.
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Confirmation count for a block: `best_height - height + 1`.
    ///
    /// Returns 0 when the block is not in the index or sits above the
    /// recorded best height.
    pub fn confirmation_count(&self, hash: &Hash) -> u64 {
        match self.by_hash.get(hash) {
            Some(record) if self.best_height >= record.height => {
                self.best_height - record.height + 1
            }
            _ => 0,
        }
    }
}

/// Parse headers mirror JSON into an index.
///
/// Accepts the wrapper form with a `headers` array, the wrapper form
/// with a `byHash` map, or a bare array of records. Empty documents and
/// unrecognized shapes are `HeadersSourceMalformed`.
pub fn parse_headers_json(bytes: &[u8]) -> Result<HeadersIndex, SpvError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| SpvError::HeadersSourceMalformed(e.to_string()))?;

    if value.is_array() {
        let records: Vec<HeaderRecord> = serde_json::from_value(value)
            .map_err(|e| SpvError::HeadersSourceMalformed(e.to_string()))?;
        return HeadersIndex::from_records(records, None, None);
    }

    let doc: HeadersDoc = serde_json::from_value(value)
        .map_err(|e| SpvError::HeadersSourceMalformed(e.to_string()))?;

    // Empty-string tipHash is treated as absent and inferred.
    let tip_hash = match doc.tip_hash.as_deref() {
        None | Some("") => None,
        Some(s) => Some(Hash::from_hex(s).map_err(|e| {
            SpvError::HeadersSourceMalformed(format!("tipHash: {}", e))
        })?),
    };

    let records = if let Some(records) = doc.headers {
        records
    } else if let Some(by_hash) = doc.by_hash {
        let mut records = Vec::with_capacity(by_hash.len());
        for (hash_str, keyed) in by_hash {
            let hash = Hash::from_hex(&hash_str).map_err(|e| {
                SpvError::HeadersSourceMalformed(format!("byHash key: {}", e))
            })?;
            records.push(HeaderRecord {
                hash,
                prev_hash: keyed.prev_hash,
                merkle_root: keyed.merkle_root,
                height: keyed.height,
            });
        }
        records
    } else {
        return Err(SpvError::HeadersSourceMalformed(
            "document has neither headers nor byHash".to_string(),
        ));
    };

    HeadersIndex::from_records(records, doc.best_height, tip_hash)
}

/// Read and parse a headers mirror file.
pub fn load_headers(path: &Path) -> Result<HeadersIndex, SpvError> {
    let bytes = std::fs::read(path)?;
    parse_headers_json(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitdata_primitives::chainhash::sha256d_hash;

    /// Build a linear chain of `n` synthetic records starting at `base`.
    fn chain(base: u64, n: u64) -> Vec<HeaderRecord> {
        let mut records = Vec::new();
        let mut prev = Hash::default();
        for i in 0..n {
            let height = base + i;
            let hash = sha256d_hash(format!("block-{}", height).as_bytes());
            records.push(HeaderRecord {
                hash,
                prev_hash: prev,
                merkle_root: sha256d_hash(format!("root-{}", height).as_bytes()),
                height,
            });
            prev = hash;
        }
        records
    }

    #[test]
    fn test_wrapper_with_headers_array() {
        let records = chain(100, 5);
        let tip = records[4].hash;
        let doc = serde_json::json!({
            "bestHeight": 104,
            "tipHash": tip.to_string(),
            "headers": records,
        });
        let index = parse_headers_json(doc.to_string().as_bytes()).unwrap();

        assert_eq!(index.best_height(), 104);
        assert_eq!(index.tip_hash(), tip);
        assert_eq!(index.len(), 5);
        assert_eq!(index.header(&records[2].hash).unwrap().height, 102);
        assert_eq!(index.header_at(100).unwrap().hash, records[0].hash);
        assert!(index.header_at(99).is_none());
    }

    #[test]
    fn test_wrapper_infers_tip_when_absent() {
        let records = chain(10, 3);
        let doc = serde_json::json!({ "headers": records });
        let index = parse_headers_json(doc.to_string().as_bytes()).unwrap();

        assert_eq!(index.best_height(), 12);
        assert_eq!(index.tip_hash(), records[2].hash);
    }

    #[test]
    fn test_wrapper_empty_tip_hash_infers() {
        let records = chain(10, 3);
        let doc = serde_json::json!({
            "bestHeight": 12,
            "tipHash": "",
            "headers": records,
        });
        let index = parse_headers_json(doc.to_string().as_bytes()).unwrap();
        assert_eq!(index.tip_hash(), records[2].hash);
    }

    #[test]
    fn test_by_hash_map_form() {
        let records = chain(200, 4);
        let mut by_hash = serde_json::Map::new();
        for r in &records {
            by_hash.insert(
                r.hash.to_string(),
                serde_json::json!({
                    "prevHash": r.prev_hash.to_string(),
                    "merkleRoot": r.merkle_root.to_string(),
                    "height": r.height,
                }),
            );
        }
        let doc = serde_json::json!({
            "bestHeight": 203,
            "tipHash": records[3].hash.to_string(),
            "byHash": by_hash,
        });
        let index = parse_headers_json(doc.to_string().as_bytes()).unwrap();

        assert_eq!(index.len(), 4);
        for r in &records {
            let found = index.header(&r.hash).unwrap();
            assert_eq!(found, r);
        }
        assert_eq!(index.best_height(), 203);
    }

    #[test]
    fn test_bare_array_form() {
        let records = chain(50, 2);
        let doc = serde_json::to_vec(&records).unwrap();
        let index = parse_headers_json(&doc).unwrap();
        assert_eq!(index.best_height(), 51);
        assert_eq!(index.tip_hash(), records[1].hash);
    }

    #[test]
    fn test_empty_documents_are_malformed() {
        for doc in ["[]", r#"{"headers": []}"#, r#"{"byHash": {}}"#] {
            match parse_headers_json(doc.as_bytes()) {
                Err(SpvError::HeadersSourceMalformed(_)) => {}
                other => panic!("{} should be malformed, got {:?}", doc, other),
            }
        }
    }

    #[test]
    fn test_unrecognized_shapes_are_malformed() {
        assert!(matches!(
            parse_headers_json(b"not json"),
            Err(SpvError::HeadersSourceMalformed(_))
        ));
        assert!(matches!(
            parse_headers_json(b"{}"),
            Err(SpvError::HeadersSourceMalformed(_))
        ));
        assert!(matches!(
            parse_headers_json(br#"{"bestHeight": 5}"#),
            Err(SpvError::HeadersSourceMalformed(_))
        ));
        // Bad hash strings inside records are malformed, not panics.
        assert!(matches!(
            parse_headers_json(br#"{"headers": [{"hash": "xyz", "prevHash": "", "merkleRoot": "", "height": 1}]}"#),
            Err(SpvError::HeadersSourceMalformed(_))
        ));
    }

    #[test]
    fn test_confirmation_count() {
        let records = chain(100, 5);
        let index = HeadersIndex::from_records(records.clone(), None, None).unwrap();

        // Tip has one confirmation, earlier blocks accumulate more.
        assert_eq!(index.confirmation_count(&records[4].hash), 1);
        assert_eq!(index.confirmation_count(&records[0].hash), 5);
        assert_eq!(index.confirmation_count(&sha256d_hash(b"unknown")), 0);
    }

    #[test]
    fn test_confirmation_count_above_best_height() {
        // Explicit bestHeight below a record's height yields zero, not
        // an underflow.
        let records = chain(100, 5);
        let index = HeadersIndex::from_records(records.clone(), Some(101), None).unwrap();
        assert_eq!(index.confirmation_count(&records[4].hash), 0);
        assert_eq!(index.confirmation_count(&records[1].hash), 1);
    }

    #[test]
    fn test_record_wire_shape() {
        let record = &chain(7, 1)[0];
        let json = serde_json::to_value(record).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["hash", "prevHash", "merkleRoot", "height"] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert_eq!(obj.len(), 4);
    }

    #[test]
    fn test_load_headers_missing_file() {
        let err = load_headers(Path::new("/nonexistent/headers.json")).unwrap_err();
        assert!(matches!(err, SpvError::HeadersSourceUnreadable(_)));
    }
}
