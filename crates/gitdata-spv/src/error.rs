//! Error types for SPV verification.

/// Error types for SPV operations.
#[derive(Debug, thiserror::Error)]
pub enum SpvError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid header length of {0}, want 80")]
    InvalidHeaderLength(usize),
    #[error("primitives error: {0}")]
    Primitives(#[from] gitdata_primitives::PrimitivesError),
    #[error("headers source unreadable: {0}")]
    HeadersSourceUnreadable(#[from] std::io::Error),
    #[error("headers source malformed: {0}")]
    HeadersSourceMalformed(String),
}

impl From<hex::FromHexError> for SpvError {
    fn from(e: hex::FromHexError) -> Self {
        SpvError::InvalidHex(e.to_string())
    }
}

/// A structured reason why an SPV envelope failed verification.
///
/// Carried through bundle assembly and surfaced to clients as a stable
/// reason code, so variants compare by value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerifyFailure {
    /// The merkle root in the proof disagrees with the block header or
    /// the headers index.
    #[error("merkle-root-mismatch")]
    MerkleRootMismatch,
    /// The merkle path does not connect the transaction to the root, or
    /// the transaction ID does not match the proof.
    #[error("merkle-path-invalid")]
    MerklePathInvalid,
    /// The referenced block is not present in the headers index and no
    /// valid header chain connects it to one that is.
    #[error("unknown-block")]
    UnknownBlock,
    /// The anchor is valid but has not accumulated enough confirmations.
    #[error("insufficient-confirmations: {confirmations} < {required}")]
    InsufficientConfirmations {
        /// Confirmations observed for the anchoring block.
        confirmations: u64,
        /// Confirmations the verification policy requires.
        required: u64,
    },
    /// The envelope's block header (or a header-chain entry) is not a
    /// valid 80-byte header encoding.
    #[error("invalid-block-header: {0}")]
    InvalidBlockHeader(String),
    /// The envelope's raw transaction is not valid hex or is empty.
    #[error("invalid-raw-tx: {0}")]
    InvalidRawTx(String),
}

impl VerifyFailure {
    /// Stable machine-readable code for this failure.
    pub fn reason_code(&self) -> &'static str {
        match self {
            VerifyFailure::MerkleRootMismatch => "merkle-root-mismatch",
            VerifyFailure::MerklePathInvalid => "merkle-path-invalid",
            VerifyFailure::UnknownBlock => "unknown-block",
            VerifyFailure::InsufficientConfirmations { .. } => "insufficient-confirmations",
            VerifyFailure::InvalidBlockHeader(_) => "invalid-block-header",
            VerifyFailure::InvalidRawTx(_) => "invalid-raw-tx",
        }
    }

    /// The confirmation count observed at failure time, when the variant
    /// carries one.
    pub fn confirmations(&self) -> Option<u64> {
        match self {
            VerifyFailure::InsufficientConfirmations { confirmations, .. } => Some(*confirmations),
            _ => None,
        }
    }
}
