//! TTL and mtime gated snapshot cache over the headers mirror file.
//!
//! Verification paths call [`HeadersSnapshot::get`] for every proof, so
//! the parsed index is cached and only re-read when the file's
//! modification time changes or the TTL lapses. A failed reload is an
//! error, never a silently served stale index.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime};

use tracing::info;

use crate::error::SpvError;
use crate::headers::{load_headers, HeadersIndex};

const DEFAULT_HEADERS_FILE: &str = "./data/headers.json";
const DEFAULT_TTL_MS: u64 = 60_000;

#[derive(Debug)]
struct SnapshotState {
    index: Arc<HeadersIndex>,
    modified: Option<SystemTime>,
    loaded_at: Instant,
}

/// A cached view of the headers mirror file.
///
/// Shared across verifying threads behind an `Arc`; callers receive an
/// `Arc<HeadersIndex>` that stays coherent for the duration of one
/// verification even if the snapshot reloads underneath them.
#[derive(Debug)]
pub struct HeadersSnapshot {
    path: PathBuf,
    ttl: Duration,
    state: RwLock<Option<SnapshotState>>,
}

impl HeadersSnapshot {
    /// Create a snapshot over the given mirror file with the given TTL.
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        HeadersSnapshot {
            path: path.into(),
            ttl,
            state: RwLock::new(None),
        }
    }

    /// Create a snapshot configured from the environment.
    ///
    /// Reads `HEADERS_FILE` (default `./data/headers.json`) and
    /// `HEADERS_SNAPSHOT_TTL_MS` (default 60000).
    pub fn from_env() -> Self {
        let path = std::env::var("HEADERS_FILE")
            .unwrap_or_else(|_| DEFAULT_HEADERS_FILE.to_string());
        let ttl_ms = std::env::var("HEADERS_SNAPSHOT_TTL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_MS);
        HeadersSnapshot::new(path, Duration::from_millis(ttl_ms))
    }

    /// Path of the mirror file this snapshot watches.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the current headers index, reloading the mirror file when
    /// the cached copy is stale.
    ///
    /// The cached index is served while the TTL has not lapsed and the
    /// file's modification time is unchanged. A stat failure counts as
    /// stale, so a deleted mirror surfaces as a read error rather than
    /// a stale index.
    pub fn get(&self) -> Result<Arc<HeadersIndex>, SpvError> {
        let modified = file_modified(&self.path);
        {
            let state = self.state.read().unwrap();
            if let Some(ref s) = *state {
                if s.loaded_at.elapsed() < self.ttl
                    && modified.is_some()
                    && s.modified == modified
                {
                    return Ok(Arc::clone(&s.index));
                }
            }
        }
        self.reload()
    }

    /// Drop the cached index so the next `get` re-reads the file.
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap();
        *state = None;
    }

    fn reload(&self) -> Result<Arc<HeadersIndex>, SpvError> {
        let mut state = self.state.write().unwrap();

        // Another caller may have reloaded while we waited on the lock.
        let modified = file_modified(&self.path);
        if let Some(ref s) = *state {
            if s.loaded_at.elapsed() < self.ttl && modified.is_some() && s.modified == modified {
                return Ok(Arc::clone(&s.index));
            }
        }

        let index = Arc::new(load_headers(&self.path)?);
        info!(
            path = %self.path.display(),
            records = index.len(),
            best_height = index.best_height(),
            "headers snapshot reloaded"
        );
        *state = Some(SnapshotState {
            index: Arc::clone(&index),
            modified,
            loaded_at: Instant::now(),
        });
        Ok(index)
    }
}

fn file_modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitdata_primitives::chainhash::sha256d_hash;

    fn write_mirror(path: &Path, base: u64, n: u64) {
        let mut headers = Vec::new();
        let mut prev = gitdata_primitives::chainhash::Hash::default().to_string();
        for i in 0..n {
            let height = base + i;
            let hash = sha256d_hash(format!("block-{}", height).as_bytes()).to_string();
            headers.push(serde_json::json!({
                "hash": hash,
                "prevHash": prev,
                "merkleRoot": sha256d_hash(format!("root-{}", height).as_bytes()).to_string(),
                "height": height,
            }));
            prev = hash;
        }
        let doc = serde_json::json!({ "headers": headers });
        std::fs::write(path, doc.to_string()).unwrap();
    }

    #[test]
    fn test_get_serves_cached_index_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.json");
        write_mirror(&path, 100, 3);

        let snapshot = HeadersSnapshot::new(&path, Duration::from_secs(3600));
        let first = snapshot.get().unwrap();
        let second = snapshot.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.best_height(), 102);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.json");
        write_mirror(&path, 100, 3);

        let snapshot = HeadersSnapshot::new(&path, Duration::from_secs(3600));
        let first = snapshot.get().unwrap();
        snapshot.invalidate();
        let second = snapshot.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.best_height(), first.best_height());
    }

    #[test]
    fn test_zero_ttl_picks_up_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.json");
        write_mirror(&path, 100, 3);

        let snapshot = HeadersSnapshot::new(&path, Duration::ZERO);
        assert_eq!(snapshot.get().unwrap().best_height(), 102);

        write_mirror(&path, 100, 5);
        assert_eq!(snapshot.get().unwrap().best_height(), 104);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot =
            HeadersSnapshot::new(dir.path().join("absent.json"), Duration::from_secs(60));
        assert!(matches!(
            snapshot.get(),
            Err(SpvError::HeadersSourceUnreadable(_))
        ));
    }

    #[test]
    fn test_malformed_file_never_serves_stale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.json");
        write_mirror(&path, 100, 3);

        let snapshot = HeadersSnapshot::new(&path, Duration::ZERO);
        snapshot.get().unwrap();

        std::fs::write(&path, "{ corrupt").unwrap();
        assert!(matches!(
            snapshot.get(),
            Err(SpvError::HeadersSourceMalformed(_))
        ));
        // Still failing on the second call rather than serving the old index.
        assert!(snapshot.get().is_err());

        write_mirror(&path, 100, 4);
        assert_eq!(snapshot.get().unwrap().best_height(), 103);
    }

    #[test]
    fn test_from_env_defaults() {
        std::env::remove_var("HEADERS_FILE");
        std::env::remove_var("HEADERS_SNAPSHOT_TTL_MS");
        let snapshot = HeadersSnapshot::from_env();
        assert_eq!(snapshot.path(), Path::new("./data/headers.json"));
        assert_eq!(snapshot.ttl, Duration::from_millis(60_000));
    }
}
