//! Lineage bundle wire types.
//!
//! The bundle is the response payload consumers verify for themselves:
//! a parent graph rooted at a target version, the manifest for every
//! node, and an SPV proof envelope for every node. Field names follow
//! the published schema and must not drift.

use gitdata_spv::SpvEnvelope;
use serde::{Deserialize, Serialize};

use crate::catalog::VersionId;

/// Value of the `bundleType` discriminator.
pub const BUNDLE_TYPE: &str = "datasetLineageBundle";

/// A lineage bundle rooted at one target version.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageBundle {
    /// Always [`BUNDLE_TYPE`].
    pub bundle_type: String,
    /// The version the bundle was requested for.
    pub target: VersionId,
    /// Parent graph reachable from the target within the depth bound.
    pub graph: LineageGraph,
    /// One manifest entry per graph node, in node order.
    pub manifests: Vec<ManifestEntry>,
    /// One proof entry per graph node, in node order.
    pub proofs: Vec<ProofEntry>,
}

impl LineageBundle {
    /// Copy of the bundle with confirmation counts removed from every
    /// proof envelope. Confirmations are a property of the chain tip at
    /// read time, so only this structural form is ever cached.
    pub fn structural_clone(&self) -> LineageBundle {
        let mut copy = self.clone();
        for proof in &mut copy.proofs {
            proof.envelope.confirmations = None;
        }
        copy
    }
}

/// Nodes and directed child-to-parent edges of the lineage graph.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LineageGraph {
    /// One node per distinct version encountered.
    pub nodes: Vec<LineageNode>,
    /// Directed edges, child first.
    pub edges: Vec<LineageEdge>,
}

/// One version in the lineage graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageNode {
    /// Version identifier.
    pub version_id: VersionId,
    /// Hash of the version's manifest.
    pub manifest_hash: String,
    /// Anchoring outpoint as `txid:vout`; all zeros when the version has
    /// no recorded declaration transaction.
    pub txo: String,
}

/// A directed derivation edge: `child` was derived from `parent`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    /// Deriving version.
    pub child: VersionId,
    /// Version it derives from.
    pub parent: VersionId,
}

/// A manifest carried alongside the graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Hash of the manifest body.
    pub manifest_hash: String,
    /// The manifest document.
    pub manifest: serde_json::Value,
}

/// An SPV proof for one version's anchoring transaction.
///
/// Fresh confirmation counts are written into
/// `envelope.confirmations` at response time.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofEntry {
    /// Version the proof belongs to.
    pub version_id: VersionId,
    /// The proof envelope.
    pub envelope: SpvEnvelope,
}
