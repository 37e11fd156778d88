//! Block header and raw transaction codec.
//!
//! Headers use the fixed 80-byte wire encoding: version, previous block
//! hash, merkle root, time, bits, nonce. Hash fields appear on the wire
//! in internal (little-endian) byte order, so they map directly onto
//! `Hash` without reversal.

use gitdata_primitives::chainhash::{sha256d_hash, Hash};

use crate::error::SpvError;

/// Serialized size of a block header in bytes.
pub const HEADER_SIZE: usize = 80;

/// Fields decoded from an 80-byte block header, plus the header's own
/// hash (double SHA-256 of the raw encoding).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedHeader {
    /// Hash of the raw header bytes.
    pub block_hash: Hash,
    /// Hash of the previous block.
    pub prev_hash: Hash,
    /// Merkle root of the block's transactions.
    pub merkle_root: Hash,
    /// Block version.
    pub version: i32,
    /// Block timestamp (seconds since the Unix epoch).
    pub time: u32,
    /// Difficulty target in compact form.
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
}

/// Parse an 80-byte block header from its hex encoding.
///
/// # Arguments
/// * `header_hex` - Hex string of exactly 160 characters (80 bytes).
///
/// # Returns
/// The decoded fields together with the header's computed block hash,
/// or an error if the hex is invalid or the length is wrong.
pub fn parse_block_header(header_hex: &str) -> Result<ParsedHeader, SpvError> {
    let raw = hex::decode(header_hex)?;
    if raw.len() != HEADER_SIZE {
        return Err(SpvError::InvalidHeaderLength(raw.len()));
    }

    let mut version_bytes = [0u8; 4];
    version_bytes.copy_from_slice(&raw[0..4]);
    let mut time_bytes = [0u8; 4];
    time_bytes.copy_from_slice(&raw[68..72]);
    let mut bits_bytes = [0u8; 4];
    bits_bytes.copy_from_slice(&raw[72..76]);
    let mut nonce_bytes = [0u8; 4];
    nonce_bytes.copy_from_slice(&raw[76..80]);

    Ok(ParsedHeader {
        block_hash: sha256d_hash(&raw),
        prev_hash: Hash::from_bytes(&raw[4..36])?,
        merkle_root: Hash::from_bytes(&raw[36..68])?,
        version: i32::from_le_bytes(version_bytes),
        time: u32::from_le_bytes(time_bytes),
        bits: u32::from_le_bytes(bits_bytes),
        nonce: u32::from_le_bytes(nonce_bytes),
    })
}

/// Compute the transaction ID of a raw transaction given as hex.
///
/// The txid is the double SHA-256 of the raw bytes, kept in internal
/// order so it displays byte-reversed like every other chain hash.
/// Empty input hashes the empty byte string; it is not an encoding
/// error here, and the resulting txid matches no real transaction.
pub fn txid_from_raw_tx(raw_tx_hex: &str) -> Result<Hash, SpvError> {
    let raw = hex::decode(raw_tx_hex)?;
    Ok(sha256d_hash(&raw))
}
