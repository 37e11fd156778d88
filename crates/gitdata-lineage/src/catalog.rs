//! Catalog access: version identifiers and the read API over the
//! external store of declarations, manifests, and proof envelopes.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use gitdata_primitives::chainhash::Hash;
use gitdata_spv::SpvEnvelope;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CatalogError, LineageError};

/// Identifier of a dataset version: 64 hex characters, normalized to
/// lowercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionId(String);

impl VersionId {
    /// Validate and normalize a version identifier.
    pub fn new(s: &str) -> Result<Self, LineageError> {
        if s.len() != 64 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LineageError::InvalidVersionId(s.to_string()));
        }
        Ok(VersionId(s.to_ascii_lowercase()))
    }

    /// The identifier as a lowercase hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VersionId {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionId::new(s)
    }
}

impl AsRef<str> for VersionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for VersionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VersionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        VersionId::new(&s).map_err(serde::de::Error::custom)
    }
}

/// The on-chain declaration anchoring a version: the transaction and
/// output index carrying its commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    /// Anchoring transaction ID.
    pub txid: Hash,
    /// Output index of the commitment within that transaction.
    pub vout: u32,
}

/// A stored manifest together with its hash.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
    /// Hash the catalog recorded for the manifest body.
    pub manifest_hash: String,
    /// The manifest document itself.
    pub manifest: serde_json::Value,
}

/// Read access to the catalog backing lineage assembly.
///
/// Implementors may be an embedded store, a database, or a remote
/// service; the collector only needs these four lookups.
pub trait Catalog: Send + Sync {
    /// Declaration anchoring the version, when one is recorded.
    fn declaration(&self, version_id: &VersionId) -> Result<Option<Declaration>, CatalogError>;

    /// Manifest recorded for the version.
    fn manifest(&self, version_id: &VersionId) -> Result<Option<ManifestRecord>, CatalogError>;

    /// SPV envelope recorded for the version's anchoring transaction.
    fn envelope(&self, version_id: &VersionId) -> Result<Option<SpvEnvelope>, CatalogError>;

    /// Parent versions the version declares.
    fn parents(&self, version_id: &VersionId) -> Result<Vec<VersionId>, CatalogError>;
}

/// In-memory catalog used in tests and as a reference implementation.
#[derive(Default)]
pub struct MemoryCatalog {
    declarations: RwLock<HashMap<VersionId, Declaration>>,
    manifests: RwLock<HashMap<VersionId, ManifestRecord>>,
    envelopes: RwLock<HashMap<VersionId, SpvEnvelope>>,
    parents: RwLock<HashMap<VersionId, Vec<VersionId>>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration for a version.
    pub fn put_declaration(&self, version_id: VersionId, declaration: Declaration) {
        let mut map = self.declarations.write().unwrap();
        map.insert(version_id, declaration);
    }

    /// Record a manifest for a version.
    pub fn put_manifest(&self, version_id: VersionId, record: ManifestRecord) {
        let mut map = self.manifests.write().unwrap();
        map.insert(version_id, record);
    }

    /// Record a proof envelope for a version.
    pub fn put_envelope(&self, version_id: VersionId, envelope: SpvEnvelope) {
        let mut map = self.envelopes.write().unwrap();
        map.insert(version_id, envelope);
    }

    /// Record the parent set of a version.
    pub fn put_parents(&self, version_id: VersionId, parents: Vec<VersionId>) {
        let mut map = self.parents.write().unwrap();
        map.insert(version_id, parents);
    }
}

impl Catalog for MemoryCatalog {
    fn declaration(&self, version_id: &VersionId) -> Result<Option<Declaration>, CatalogError> {
        let map = self.declarations.read().unwrap();
        Ok(map.get(version_id).cloned())
    }

    fn manifest(&self, version_id: &VersionId) -> Result<Option<ManifestRecord>, CatalogError> {
        let map = self.manifests.read().unwrap();
        Ok(map.get(version_id).cloned())
    }

    fn envelope(&self, version_id: &VersionId) -> Result<Option<SpvEnvelope>, CatalogError> {
        let map = self.envelopes.read().unwrap();
        Ok(map.get(version_id).cloned())
    }

    fn parents(&self, version_id: &VersionId) -> Result<Vec<VersionId>, CatalogError> {
        let map = self.parents.read().unwrap();
        Ok(map.get(version_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_id_normalizes_case() {
        let upper = VersionId::new(&"AB".repeat(32)).unwrap();
        let lower = VersionId::new(&"ab".repeat(32)).unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "ab".repeat(32));
    }

    #[test]
    fn test_version_id_rejects_bad_input() {
        assert!(VersionId::new("").is_err());
        assert!(VersionId::new(&"a".repeat(63)).is_err());
        assert!(VersionId::new(&"a".repeat(65)).is_err());
        assert!(VersionId::new(&"g".repeat(64)).is_err());
    }

    #[test]
    fn test_version_id_serde() {
        let id = VersionId::new(&"0f".repeat(32)).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "0f".repeat(32)));
        let back: VersionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<VersionId>("\"nope\"").is_err());
    }

    #[test]
    fn test_memory_catalog_round_trip() {
        let catalog = MemoryCatalog::new();
        let v = VersionId::new(&"aa".repeat(32)).unwrap();
        let p = VersionId::new(&"bb".repeat(32)).unwrap();

        assert!(catalog.manifest(&v).unwrap().is_none());
        assert!(catalog.parents(&v).unwrap().is_empty());

        catalog.put_manifest(
            v.clone(),
            ManifestRecord {
                manifest_hash: "cc".repeat(32),
                manifest: serde_json::json!({"datasetId": "ds-1"}),
            },
        );
        catalog.put_parents(v.clone(), vec![p.clone()]);

        let record = catalog.manifest(&v).unwrap().unwrap();
        assert_eq!(record.manifest_hash, "cc".repeat(32));
        assert_eq!(catalog.parents(&v).unwrap(), vec![p]);
    }
}
