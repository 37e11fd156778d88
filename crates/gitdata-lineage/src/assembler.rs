//! Bundle assembly: cache-first reads with live re-verification.
//!
//! A cache hit is never returned as stored. Every proof in the cached
//! body is re-verified against the current headers snapshot and the
//! current policy, and fresh confirmations are written into the copy.
//! A hit that fails re-verification is invalidated and rebuilt, which
//! is what protects readers from a bundle whose anchoring block was
//! reorganized away after it was cached.

use std::sync::Arc;

use gitdata_spv::{verify_envelope_against_headers, HeadersSnapshot};
use tracing::{debug, info};

use crate::bundle::LineageBundle;
use crate::cache::{BundleCache, BundleKey};
use crate::catalog::{Catalog, VersionId};
use crate::collector::collect_lineage;
use crate::error::LineageError;

/// Traversal and confirmation policy applied during assembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineagePolicy {
    /// Maximum parent-graph depth to traverse.
    pub max_depth: u32,
    /// Minimum confirmations every proof must reach.
    pub min_confirmations: u64,
}

impl Default for LineagePolicy {
    fn default() -> Self {
        LineagePolicy {
            max_depth: 8,
            min_confirmations: 1,
        }
    }
}

impl LineagePolicy {
    /// Read `BUNDLE_MAX_DEPTH` (default 8) and `POLICY_MIN_CONFS`
    /// (default 1) from the environment.
    pub fn from_env() -> Self {
        let defaults = LineagePolicy::default();
        let max_depth = std::env::var("BUNDLE_MAX_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_depth);
        let min_confirmations = std::env::var("POLICY_MIN_CONFS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.min_confirmations);
        LineagePolicy {
            max_depth,
            min_confirmations,
        }
    }
}

/// Whether an assembled bundle was served from cache or freshly built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Structural body came from the cache; confirmations recomputed.
    Hit,
    /// Bundle was collected and verified from scratch.
    Miss,
}

/// Assembles lineage bundles from a catalog, verifying every proof
/// against the live headers snapshot.
pub struct BundleAssembler {
    catalog: Arc<dyn Catalog>,
    snapshot: Arc<HeadersSnapshot>,
    cache: BundleCache,
    policy: LineagePolicy,
}

impl BundleAssembler {
    /// Create an assembler over a catalog and headers snapshot.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        snapshot: Arc<HeadersSnapshot>,
        cache: BundleCache,
        policy: LineagePolicy,
    ) -> Self {
        BundleAssembler {
            catalog,
            snapshot,
            cache,
            policy,
        }
    }

    /// The policy this assembler enforces.
    pub fn policy(&self) -> LineagePolicy {
        self.policy
    }

    /// The bundle cache, exposed so the surrounding system can
    /// invalidate entries on external signals.
    pub fn cache(&self) -> &BundleCache {
        &self.cache
    }

    /// Assemble the bundle for a version at the given depth (policy
    /// default when `None`), reporting whether the cache served it.
    ///
    /// Every proof in the returned bundle carries confirmations
    /// computed against the current headers snapshot; a proof below the
    /// minimum-confirmations policy fails assembly with
    /// `InvalidEnvelope`.
    pub fn assemble(
        &self,
        version_id: &VersionId,
        depth: Option<u32>,
    ) -> Result<(LineageBundle, CacheOutcome), LineageError> {
        let depth = depth.unwrap_or(self.policy.max_depth);
        let key = BundleKey {
            version_id: version_id.clone(),
            depth,
        };

        if let Some(bundle) = self.try_cached(&key)? {
            return Ok((bundle, CacheOutcome::Hit));
        }

        // One rebuild per key at a time; waiters re-check the cache
        // once the builder releases the lock.
        let build_lock = self.cache.build_lock(&key);
        let _guard = build_lock.lock().unwrap();
        if let Some(bundle) = self.try_cached(&key)? {
            return Ok((bundle, CacheOutcome::Hit));
        }

        let bundle = self.build(&key)?;
        Ok((bundle, CacheOutcome::Miss))
    }

    /// Serve from cache when every cached proof still verifies under
    /// the current snapshot and policy. A failing proof invalidates the
    /// entry and reports a miss so the caller rebuilds.
    fn try_cached(&self, key: &BundleKey) -> Result<Option<LineageBundle>, LineageError> {
        let (mut bundle, _stored_policy_ok) = match self.cache.get(key) {
            Some(cached) => cached,
            None => return Ok(None),
        };

        let index = self.snapshot.get()?;
        for proof in &mut bundle.proofs {
            match verify_envelope_against_headers(
                &proof.envelope,
                &index,
                self.policy.min_confirmations,
            ) {
                Ok(verified) => proof.envelope.confirmations = Some(verified.confirmations),
                Err(reason) => {
                    debug!(
                        version = %proof.version_id,
                        reason = reason.reason_code(),
                        "cached bundle failed re-verification, invalidating"
                    );
                    self.cache.invalidate(key);
                    return Ok(None);
                }
            }
        }
        Ok(Some(bundle))
    }

    fn build(&self, key: &BundleKey) -> Result<LineageBundle, LineageError> {
        let mut bundle = collect_lineage(self.catalog.as_ref(), &key.version_id, key.depth)?;

        let index = self.snapshot.get()?;
        for proof in &mut bundle.proofs {
            let verified = verify_envelope_against_headers(
                &proof.envelope,
                &index,
                self.policy.min_confirmations,
            )
            .map_err(|reason| LineageError::InvalidEnvelope {
                version_id: proof.version_id.clone(),
                reason,
            })?;
            proof.envelope.confirmations = Some(verified.confirmations);
        }

        self.cache.insert(key.clone(), &bundle, true);
        info!(
            version = %key.version_id,
            depth = key.depth,
            nodes = bundle.graph.nodes.len(),
            "lineage bundle assembled"
        );
        Ok(bundle)
    }
}
