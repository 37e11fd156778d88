//! Bundle cache keyed by target version and depth.
//!
//! Only the structural form of a bundle is stored: graph, manifests,
//! and proofs with confirmation counts stripped. Confirmations depend
//! on the chain tip at read time and are recomputed by the assembler on
//! every hit, so a cached body is never served as-is.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::bundle::LineageBundle;
use crate::catalog::VersionId;

const DEFAULT_TTL_MS: u64 = 60_000;

/// Cache key: one entry per requested `(version, depth)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BundleKey {
    /// Target version of the bundle.
    pub version_id: VersionId,
    /// Traversal depth the bundle was built with.
    pub depth: u32,
}

struct CacheEntry {
    body: LineageBundle,
    policy_ok: bool,
    stored_at: Instant,
}

/// TTL-bounded in-memory cache of structural lineage bundles, with a
/// per-key build lock for single-flight rebuilds.
pub struct BundleCache {
    ttl: Duration,
    entries: RwLock<HashMap<BundleKey, CacheEntry>>,
    builds: Mutex<HashMap<BundleKey, Weak<Mutex<()>>>>,
}

impl BundleCache {
    /// Create a cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        BundleCache {
            ttl,
            entries: RwLock::new(HashMap::new()),
            builds: Mutex::new(HashMap::new()),
        }
    }

    /// Create a cache configured from `BUNDLE_CACHE_TTL_MS` (default
    /// 60000).
    pub fn from_env() -> Self {
        let ttl_ms = std::env::var("BUNDLE_CACHE_TTL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_MS);
        BundleCache::new(Duration::from_millis(ttl_ms))
    }

    /// Look up the structural bundle for a key, with the policy flag
    /// recorded when it was stored.
    ///
    /// Returns a clone; the cached original is never handed out, so a
    /// caller writing confirmations into its copy cannot poison the
    /// cache. Expired entries are evicted and reported as misses.
    pub fn get(&self, key: &BundleKey) -> Option<(LineageBundle, bool)> {
        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some((entry.body.clone(), entry.policy_ok));
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: evict unless a fresh entry landed while the read
        // lock was released.
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get(key) {
            if entry.stored_at.elapsed() < self.ttl {
                return Some((entry.body.clone(), entry.policy_ok));
            }
            entries.remove(key);
        }
        None
    }

    /// Store the structural form of a bundle.
    ///
    /// Confirmations are stripped before storage regardless of what the
    /// caller's copy carries.
    pub fn insert(&self, key: BundleKey, bundle: &LineageBundle, policy_ok: bool) {
        let entry = CacheEntry {
            body: bundle.structural_clone(),
            policy_ok,
            stored_at: Instant::now(),
        };
        let mut entries = self.entries.write().unwrap();
        entries.insert(key, entry);
    }

    /// Per-key mutex serializing rebuilds of one key. Concurrent
    /// requests for the same key lock it, and waiters re-check the
    /// cache once they acquire it.
    ///
    /// The map holds weak references and is swept here once the last
    /// holder drops its `Arc`, so it never outgrows the set of builds
    /// in flight.
    pub fn build_lock(&self, key: &BundleKey) -> Arc<Mutex<()>> {
        let mut builds = self.builds.lock().unwrap();
        builds.retain(|_, slot| slot.strong_count() > 0);
        if let Some(lock) = builds.get(key).and_then(Weak::upgrade) {
            return lock;
        }
        let lock = Arc::new(Mutex::new(()));
        builds.insert(key.clone(), Arc::downgrade(&lock));
        lock
    }

    /// Drop one entry.
    pub fn invalidate(&self, key: &BundleKey) {
        let mut entries = self.entries.write().unwrap();
        if entries.remove(key).is_some() {
            debug!(version = %key.version_id, depth = key.depth, "bundle cache entry invalidated");
        }
    }

    /// Drop every entry, e.g. after detecting a chain reorganization.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write().unwrap();
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "bundle cache cleared");
    }

    /// Number of live entries, counting expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{LineageGraph, ProofEntry, BUNDLE_TYPE};
    use gitdata_primitives::chainhash::sha256d_hash;
    use gitdata_spv::{BlockRef, MerkleProof, SpvEnvelope};

    fn key(byte: u8, depth: u32) -> BundleKey {
        BundleKey {
            version_id: VersionId::new(&format!("{:02x}", byte).repeat(32)).unwrap(),
            depth,
        }
    }

    fn bundle_with_confirmations(byte: u8, confirmations: Option<u64>) -> LineageBundle {
        let version_id = VersionId::new(&format!("{:02x}", byte).repeat(32)).unwrap();
        LineageBundle {
            bundle_type: BUNDLE_TYPE.to_string(),
            target: version_id.clone(),
            graph: LineageGraph::default(),
            manifests: vec![],
            proofs: vec![ProofEntry {
                version_id,
                envelope: SpvEnvelope {
                    raw_tx: "00".to_string(),
                    txid: None,
                    proof: MerkleProof {
                        txid: sha256d_hash(&[0x00]),
                        merkle_root: sha256d_hash(&[0x00]),
                        path: vec![],
                    },
                    block: BlockRef::HashHeight {
                        block_hash: sha256d_hash(b"block"),
                        block_height: 1,
                    },
                    header_chain: None,
                    confirmations,
                    ts: None,
                },
            }],
        }
    }

    #[test]
    fn test_insert_strips_confirmations() {
        let cache = BundleCache::new(Duration::from_secs(60));
        let k = key(0x01, 8);
        cache.insert(k.clone(), &bundle_with_confirmations(0x01, Some(5)), true);

        let (body, policy_ok) = cache.get(&k).unwrap();
        assert!(policy_ok);
        assert!(body.proofs[0].envelope.confirmations.is_none());
    }

    #[test]
    fn test_get_returns_independent_copies() {
        let cache = BundleCache::new(Duration::from_secs(60));
        let k = key(0x02, 8);
        cache.insert(k.clone(), &bundle_with_confirmations(0x02, None), true);

        let (mut first, _) = cache.get(&k).unwrap();
        first.proofs[0].envelope.confirmations = Some(99);

        let (second, _) = cache.get(&k).unwrap();
        assert!(second.proofs[0].envelope.confirmations.is_none());
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache = BundleCache::new(Duration::ZERO);
        let k = key(0x03, 8);
        cache.insert(k.clone(), &bundle_with_confirmations(0x03, None), true);
        assert_eq!(cache.len(), 1);

        assert!(cache.get(&k).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_invalidate_and_invalidate_all() {
        let cache = BundleCache::new(Duration::from_secs(60));
        cache.insert(key(0x04, 8), &bundle_with_confirmations(0x04, None), true);
        cache.insert(key(0x05, 8), &bundle_with_confirmations(0x05, None), false);
        assert_eq!(cache.len(), 2);

        cache.invalidate(&key(0x04, 8));
        assert!(cache.get(&key(0x04, 8)).is_none());
        let (_, policy_ok) = cache.get(&key(0x05, 8)).unwrap();
        assert!(!policy_ok);

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_distinguish_depth() {
        let cache = BundleCache::new(Duration::from_secs(60));
        cache.insert(key(0x06, 2), &bundle_with_confirmations(0x06, None), true);
        assert!(cache.get(&key(0x06, 2)).is_some());
        assert!(cache.get(&key(0x06, 3)).is_none());
    }

    #[test]
    fn test_build_lock_is_per_key() {
        let cache = BundleCache::new(Duration::from_secs(60));
        let a1 = cache.build_lock(&key(0x07, 8));
        let a2 = cache.build_lock(&key(0x07, 8));
        let b = cache.build_lock(&key(0x08, 8));
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[test]
    fn test_released_build_locks_are_pruned() {
        let cache = BundleCache::new(Duration::from_secs(60));
        for byte in 0..=255u8 {
            for depth in 0..4 {
                let lock = cache.build_lock(&key(byte, depth));
                let _guard = lock.lock().unwrap();
            }
        }

        // The next call sweeps every released lock; only the one still
        // held stays in the map.
        let live = cache.build_lock(&key(0x01, 99));
        let _guard = live.lock().unwrap();
        assert_eq!(cache.builds.lock().unwrap().len(), 1);
    }
}
