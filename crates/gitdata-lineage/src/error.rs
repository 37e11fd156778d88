//! Error types for lineage collection and bundle assembly.

use gitdata_spv::{SpvError, VerifyFailure};

use crate::catalog::VersionId;

/// Error raised by a catalog backend.
#[derive(Clone, Debug, thiserror::Error)]
#[error("catalog error: {0}")]
pub struct CatalogError(pub String);

/// Error types for lineage operations.
///
/// The `missing-*` and `invalid-envelope` messages are stable: callers
/// match on them to classify incomplete lineage versus broken proofs.
#[derive(Debug, thiserror::Error)]
pub enum LineageError {
    #[error("missing-manifest:{0}")]
    MissingManifest(VersionId),
    #[error("missing-envelope:{0}")]
    MissingEnvelope(VersionId),
    #[error("invalid-envelope:{version_id}: {reason}")]
    InvalidEnvelope {
        version_id: VersionId,
        reason: VerifyFailure,
    },
    #[error("invalid version id: {0}")]
    InvalidVersionId(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("spv error: {0}")]
    Spv(#[from] SpvError),
}
