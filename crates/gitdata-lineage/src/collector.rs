//! Lineage graph collection.

use std::collections::HashSet;

use gitdata_primitives::chainhash::Hash;
use tracing::debug;

use crate::bundle::{
    LineageBundle, LineageEdge, LineageGraph, LineageNode, ManifestEntry, ProofEntry, BUNDLE_TYPE,
};
use crate::catalog::{Catalog, VersionId};
use crate::error::LineageError;

/// Walk the parent graph from `root` to at most `max_depth` hops and
/// gather everything a bundle needs.
///
/// Depth-bounded DFS over an explicit stack with a visited set, so a
/// cyclic parent graph terminates and each version is expanded once.
/// Edges are recorded even when the parent was already visited, keeping
/// the full graph shape. Envelopes are shape-checked as they leave the
/// catalog but not verified against headers; the returned bundle is
/// structural and carries no fresh confirmation counts.
///
/// # Errors
/// `MissingManifest` or `MissingEnvelope` when a reachable version lacks
/// either record, `InvalidEnvelope` when a stored envelope is not even
/// structurally sound; lineage is only assembled for fully anchored
/// versions.
pub fn collect_lineage(
    catalog: &dyn Catalog,
    root: &VersionId,
    max_depth: u32,
) -> Result<LineageBundle, LineageError> {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut manifests = Vec::new();
    let mut proofs = Vec::new();
    let mut visited: HashSet<VersionId> = HashSet::new();
    let mut stack = vec![(root.clone(), 0u32)];

    while let Some((version_id, depth)) = stack.pop() {
        if !visited.insert(version_id.clone()) {
            continue;
        }

        let declaration = catalog.declaration(&version_id)?;
        let manifest = catalog
            .manifest(&version_id)?
            .ok_or_else(|| LineageError::MissingManifest(version_id.clone()))?;

        // Versions declared off-chain get a zero outpoint placeholder.
        let txo = match &declaration {
            Some(d) => format!("{}:{}", d.txid, d.vout),
            None => format!("{}:0", Hash::default()),
        };
        nodes.push(LineageNode {
            version_id: version_id.clone(),
            manifest_hash: manifest.manifest_hash.clone(),
            txo,
        });
        manifests.push(ManifestEntry {
            manifest_hash: manifest.manifest_hash,
            manifest: manifest.manifest,
        });

        let envelope = catalog
            .envelope(&version_id)?
            .ok_or_else(|| LineageError::MissingEnvelope(version_id.clone()))?;
        envelope
            .validate()
            .map_err(|reason| LineageError::InvalidEnvelope {
                version_id: version_id.clone(),
                reason,
            })?;
        proofs.push(ProofEntry {
            version_id: version_id.clone(),
            envelope,
        });

        if depth < max_depth {
            for parent in catalog.parents(&version_id)? {
                edges.push(LineageEdge {
                    child: version_id.clone(),
                    parent: parent.clone(),
                });
                if !visited.contains(&parent) {
                    stack.push((parent, depth + 1));
                }
            }
        }
    }

    debug!(
        version = %root,
        nodes = nodes.len(),
        edges = edges.len(),
        "lineage collected"
    );

    Ok(LineageBundle {
        bundle_type: BUNDLE_TYPE.to_string(),
        target: root.clone(),
        graph: LineageGraph { nodes, edges },
        manifests,
        proofs,
    })
}
