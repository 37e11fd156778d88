#![deny(missing_docs)]

//! # gitdata-client
//!
//! HTTP client for GitData nodes: fetches lineage bundles and headers
//! mirror documents, and verifies fetched bundles offline against a
//! local headers index.
//!
//! # Example
//!
//! ```no_run
//! use gitdata_client::{ClientConfig, GitdataClient};
//! use gitdata_lineage::VersionId;
//!
//! # async fn example() -> Result<(), gitdata_client::ClientError> {
//! let client = GitdataClient::new(ClientConfig {
//!     base_url: "http://localhost:8788".to_string(),
//!     ..Default::default()
//! });
//!
//! let version = VersionId::new(&"ab".repeat(32)).unwrap();
//! let bundle = client.fetch_bundle(&version, Some(4)).await?;
//! let index = client.fetch_headers().await?;
//!
//! let report = gitdata_client::verify_bundle(&bundle, &index, 1);
//! println!("verified: {} at height {}", report.ok, report.best_height);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod types;
pub mod verify;


pub use client::GitdataClient;
pub use error::ClientError;
pub use types::{BundleVerification, ClientConfig, ProofVerification};
pub use verify::verify_bundle;
