/// GitData SDK - Hash primitives.
///
/// This crate provides the foundational building blocks for the GitData SDK:
/// - Hash functions (SHA-256, double SHA-256)
/// - Chain hash type for transaction and block identification

pub mod hash;
pub mod chainhash;

mod error;
pub use error::PrimitivesError;
