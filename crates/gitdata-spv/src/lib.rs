//! GitData SDK - SPV verification.
//!
//! Provides Simplified Payment Verification (SPV) of anchored dataset
//! versions: block header parsing, merkle path evaluation, a headers
//! index loaded from a local mirror file, a TTL/mtime snapshot cache
//! over that file, and full SPV envelope verification.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod headers;
pub mod merkle;
pub mod snapshot;

pub use codec::{parse_block_header, txid_from_raw_tx, ParsedHeader, HEADER_SIZE};
pub use envelope::{verify_envelope_against_headers, BlockRef, MerkleProof, SpvEnvelope, Verified};
pub use error::{SpvError, VerifyFailure};
pub use headers::{load_headers, parse_headers_json, HeaderRecord, HeadersIndex};
pub use merkle::{merkle_parent, verify_merkle_path, MerkleNode, Position};
pub use snapshot::HeadersSnapshot;
