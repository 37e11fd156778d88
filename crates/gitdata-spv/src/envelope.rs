//! SPV envelope types and verification.
//!
//! An envelope carries everything needed to check that a transaction is
//! anchored in the chain: the raw transaction, a merkle inclusion proof,
//! a reference to the anchoring block, and optionally a chain of headers
//! linking that block to one the local mirror already knows.

use gitdata_primitives::chainhash::Hash;
use serde::{Deserialize, Serialize};

use crate::codec::{parse_block_header, txid_from_raw_tx};
use crate::error::VerifyFailure;
use crate::headers::HeadersIndex;
use crate::merkle::{verify_merkle_path, MerkleNode};

/// Reference to the anchoring block.
///
/// Either the full 80-byte header as hex, or the block hash with an
/// advisory height. When both appear in one JSON object the header form
/// wins, so it is listed first.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockRef {
    /// Full serialized block header.
    #[serde(rename_all = "camelCase")]
    Header {
        /// Hex encoding of the 80-byte header.
        block_header: String,
    },
    /// Block hash plus the height the producer believed it had.
    #[serde(rename_all = "camelCase")]
    HashHeight {
        /// Hash of the anchoring block.
        block_hash: Hash,
        /// Advisory height; resolution goes by hash, never by this.
        block_height: u64,
    },
}

/// Merkle inclusion proof for one transaction.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    /// Transaction ID the proof commits to.
    pub txid: Hash,
    /// Merkle root the path folds up to.
    pub merkle_root: Hash,
    /// Sibling hashes from leaf level to just below the root.
    pub path: Vec<MerkleNode>,
}

/// An SPV envelope anchoring one transaction to a block.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpvEnvelope {
    /// Raw transaction as hex.
    pub raw_tx: String,
    /// Claimed transaction ID. Advisory; the txid is always rederived
    /// from `raw_tx`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<Hash>,
    /// Merkle inclusion proof.
    pub proof: MerkleProof,
    /// Reference to the anchoring block.
    pub block: BlockRef,
    /// Headers linking the anchoring block to one in the local mirror,
    /// starting with the anchoring block's own header and followed by
    /// successive children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_chain: Option<Vec<String>>,
    /// Confirmation count claimed by the producer. Ignored during
    /// verification and recomputed from the local mirror.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    /// Producer timestamp, seconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
}

impl SpvEnvelope {
    /// Structurally validate the envelope without consulting a headers
    /// index: `rawTx` must be non-empty hex, headers must be 80 bytes.
    pub fn validate(&self) -> Result<(), VerifyFailure> {
        if self.raw_tx.is_empty() {
            return Err(VerifyFailure::InvalidRawTx("empty rawTx".to_string()));
        }
        txid_from_raw_tx(&self.raw_tx)
            .map_err(|e| VerifyFailure::InvalidRawTx(e.to_string()))?;
        if let BlockRef::Header { block_header } = &self.block {
            parse_block_header(block_header)
                .map_err(|e| VerifyFailure::InvalidBlockHeader(e.to_string()))?;
        }
        if let Some(chain) = &self.header_chain {
            for (i, header_hex) in chain.iter().enumerate() {
                parse_block_header(header_hex).map_err(|e| {
                    VerifyFailure::InvalidBlockHeader(format!("headerChain[{}]: {}", i, e))
                })?;
            }
        }
        Ok(())
    }
}

/// Successful verification outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verified {
    /// Confirmations the anchoring block has accumulated.
    pub confirmations: u64,
}

/// Verify an SPV envelope against a headers index.
///
/// Checks run in a fixed order so failures are attributed precisely:
/// the block reference is resolved first, then the proof's merkle root
/// is checked against the header, then the transaction is tied to the
/// root through the path, then the block is located in the index (or
/// reached through `header_chain`), and finally the confirmation count
/// is compared against `min_confirmations`.
pub fn verify_envelope_against_headers(
    envelope: &SpvEnvelope,
    index: &HeadersIndex,
    min_confirmations: u64,
) -> Result<Verified, VerifyFailure> {
    // Resolve the anchoring block hash, and the header's own merkle
    // root when the full header is present.
    let (target_hash, header_root) = match &envelope.block {
        BlockRef::Header { block_header } => {
            let parsed = parse_block_header(block_header)
                .map_err(|e| VerifyFailure::InvalidBlockHeader(e.to_string()))?;
            (parsed.block_hash, Some(parsed.merkle_root))
        }
        BlockRef::HashHeight { block_hash, .. } => (*block_hash, None),
    };

    if let Some(root) = header_root {
        if root != envelope.proof.merkle_root {
            return Err(VerifyFailure::MerkleRootMismatch);
        }
    }

    // The txid is rederived from the raw bytes; a claimed txid that
    // disagrees with the proof is treated as a broken proof.
    let derived_txid = txid_from_raw_tx(&envelope.raw_tx)
        .map_err(|e| VerifyFailure::InvalidRawTx(e.to_string()))?;
    if derived_txid != envelope.proof.txid {
        return Err(VerifyFailure::MerklePathInvalid);
    }
    if let Some(claimed) = envelope.txid {
        if claimed != envelope.proof.txid {
            return Err(VerifyFailure::MerklePathInvalid);
        }
    }
    if !verify_merkle_path(&derived_txid, &envelope.proof.path, &envelope.proof.merkle_root) {
        return Err(VerifyFailure::MerklePathInvalid);
    }

    let confirmations = match index.header(&target_hash) {
        Some(record) => {
            // The mirror's record for this block must agree with the
            // proof about the committed root.
            if record.merkle_root != envelope.proof.merkle_root {
                return Err(VerifyFailure::MerkleRootMismatch);
            }
            index.confirmation_count(&target_hash)
        }
        None => match &envelope.header_chain {
            Some(chain) if !chain.is_empty() => confirmations_via_header_chain(
                &target_hash,
                &envelope.proof.merkle_root,
                chain,
                index,
            )?,
            _ => return Err(VerifyFailure::UnknownBlock),
        },
    };

    if confirmations < min_confirmations {
        return Err(VerifyFailure::InsufficientConfirmations {
            confirmations,
            required: min_confirmations,
        });
    }

    Ok(Verified { confirmations })
}

/// Walk a header chain from the anchoring block to a block the index
/// knows, and derive the anchoring block's confirmations from the
/// terminus height. The walked headers are never added to the index.
fn confirmations_via_header_chain(
    target_hash: &Hash,
    proof_root: &Hash,
    chain: &[String],
    index: &HeadersIndex,
) -> Result<u64, VerifyFailure> {
    let mut parsed = Vec::with_capacity(chain.len());
    for (i, header_hex) in chain.iter().enumerate() {
        let header = parse_block_header(header_hex).map_err(|e| {
            VerifyFailure::InvalidBlockHeader(format!("headerChain[{}]: {}", i, e))
        })?;
        parsed.push(header);
    }

    // The first entry must be the anchoring block's own header.
    if parsed[0].block_hash != *target_hash {
        return Err(VerifyFailure::UnknownBlock);
    }
    if parsed[0].merkle_root != *proof_root {
        return Err(VerifyFailure::MerkleRootMismatch);
    }

    // Every later entry must be the child of the one before it.
    for i in 1..parsed.len() {
        if parsed[i].prev_hash != parsed[i - 1].block_hash {
            return Err(VerifyFailure::UnknownBlock);
        }
    }

    let terminus = &parsed[parsed.len() - 1];
    let record = index
        .header(&terminus.block_hash)
        .ok_or(VerifyFailure::UnknownBlock)?;

    let distance = (parsed.len() - 1) as u64;
    let target_height = record.height.saturating_sub(distance);
    let best = index.best_height();
    if best < target_height {
        return Ok(0);
    }
    Ok(best - target_height + 1)
}
