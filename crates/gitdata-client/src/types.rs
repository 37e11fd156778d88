//! GitData client data types: configuration and verification reports.

use gitdata_lineage::VersionId;
use serde::{Deserialize, Serialize};

/// Configuration for a [`GitdataClient`](crate::GitdataClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the GitData node (e.g. `http://localhost:8788`).
    pub base_url: String,
    /// URL serving the headers mirror document used for independent
    /// verification (e.g. a relay's `headers.json`).
    pub headers_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8788".to_string(),
            headers_url: "http://localhost:8788/headers.json".to_string(),
        }
    }
}

/// Outcome of verifying a whole bundle against a headers index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleVerification {
    /// Version the bundle targets.
    pub target: VersionId,
    /// True when every proof in the bundle verified. A bundle with no
    /// proofs does not verify.
    pub ok: bool,
    /// Best height of the index the bundle was checked against.
    pub best_height: u64,
    /// Smallest confirmation count among the passing proofs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confirmations: Option<u64>,
    /// Per-proof results, in bundle order.
    pub proofs: Vec<ProofVerification>,
}

/// Outcome of verifying a single proof entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofVerification {
    /// Version the proof anchors.
    pub version_id: VersionId,
    /// Whether the envelope verified under the given policy.
    pub ok: bool,
    /// Stable failure code when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Confirmations computed from the index. Present on success and on
    /// `insufficient-confirmations` failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
}
