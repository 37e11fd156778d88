//! GitData SDK - lineage bundles.
//!
//! Walks the parent graph of a versioned dataset through a catalog,
//! assembles a lineage bundle with SPV proofs for every version, and
//! caches the bundle's structure while recomputing confirmations on
//! every read.

pub mod assembler;
pub mod bundle;
pub mod cache;
pub mod catalog;
pub mod collector;
pub mod error;

pub use assembler::{BundleAssembler, CacheOutcome, LineagePolicy};
pub use bundle::{
    LineageBundle, LineageEdge, LineageGraph, LineageNode, ManifestEntry, ProofEntry, BUNDLE_TYPE,
};
pub use cache::{BundleCache, BundleKey};
pub use catalog::{Catalog, Declaration, ManifestRecord, MemoryCatalog, VersionId};
pub use collector::collect_lineage;
pub use error::{CatalogError, LineageError};
