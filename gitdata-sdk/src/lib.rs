#![deny(missing_docs)]

//! GitData SDK - Complete SDK.
//!
//! Re-exports all GitData SDK components for convenient single-crate usage.

pub use gitdata_primitives as primitives;
pub use gitdata_spv as spv;
pub use gitdata_lineage as lineage;
pub use gitdata_client as client;
