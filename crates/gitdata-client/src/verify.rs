//! Offline verification of fetched bundles against a headers index.

use gitdata_lineage::LineageBundle;
use gitdata_spv::{verify_envelope_against_headers, HeadersIndex};

use crate::types::{BundleVerification, ProofVerification};

/// Verify every proof in a bundle against a headers index under the
/// given minimum-confirmations policy.
///
/// Never short-circuits: each proof gets its own verdict so a caller
/// can see exactly which versions in the lineage failed and why. A
/// bundle with no proofs reports `ok: false`.
pub fn verify_bundle(
    bundle: &LineageBundle,
    index: &HeadersIndex,
    min_confirmations: u64,
) -> BundleVerification {
    let mut proofs = Vec::with_capacity(bundle.proofs.len());
    let mut ok = !bundle.proofs.is_empty();
    let mut min_confs: Option<u64> = None;

    for entry in &bundle.proofs {
        match verify_envelope_against_headers(&entry.envelope, index, min_confirmations) {
            Ok(verified) => {
                min_confs = Some(match min_confs {
                    Some(m) => m.min(verified.confirmations),
                    None => verified.confirmations,
                });
                proofs.push(ProofVerification {
                    version_id: entry.version_id.clone(),
                    ok: true,
                    reason: None,
                    confirmations: Some(verified.confirmations),
                });
            }
            Err(failure) => {
                ok = false;
                proofs.push(ProofVerification {
                    version_id: entry.version_id.clone(),
                    ok: false,
                    reason: Some(failure.reason_code().to_string()),
                    confirmations: failure.confirmations(),
                });
            }
        }
    }

    BundleVerification {
        target: bundle.target.clone(),
        ok,
        best_height: index.best_height(),
        min_confirmations: min_confs,
        proofs,
    }
}
