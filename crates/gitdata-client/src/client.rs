//! GitData HTTP client for fetching lineage bundles and headers mirrors.

use serde::de::DeserializeOwned;
use tracing::debug;

use gitdata_lineage::{LineageBundle, VersionId};
use gitdata_spv::{parse_headers_json, HeadersIndex};

use crate::error::ClientError;
use crate::types::ClientConfig;

/// HTTP client for a GitData node.
#[derive(Debug, Clone)]
pub struct GitdataClient {
    /// Client configuration.
    config: ClientConfig,
    /// Underlying HTTP client.
    client: reqwest::Client,
}

impl GitdataClient {
    /// Create a new GitData client with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }

    /// Fetch the lineage bundle for a version.
    ///
    /// `depth` overrides the node's default traversal depth when given;
    /// `None` leaves the choice to the node.
    pub async fn fetch_bundle(
        &self,
        version_id: &VersionId,
        depth: Option<u32>,
    ) -> Result<LineageBundle, ClientError> {
        let mut url = format!("{}/bundle?versionId={}", self.config.base_url, version_id);
        if let Some(depth) = depth {
            url.push_str(&format!("&depth={}", depth));
        }
        debug!(version = %version_id, depth = ?depth, "fetching lineage bundle");
        self.do_request(&url).await
    }

    /// Fetch the headers mirror document and parse it into an index.
    ///
    /// Fetching the mirror from a source independent of the node that
    /// served a bundle is what makes client-side verification more than
    /// a repeat of the node's own check.
    pub async fn fetch_headers(&self) -> Result<HeadersIndex, ClientError> {
        let resp = self.get_ok(&self.config.headers_url).await?;
        let bytes = resp.bytes().await?;
        Ok(parse_headers_json(&bytes)?)
    }

    /// Perform a GET request and deserialize the JSON response.
    async fn do_request<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let resp = self.get_ok(url).await?;
        let text = resp.text().await?;
        let parsed = serde_json::from_str(&text)?;
        Ok(parsed)
    }

    /// Perform a GET request, mapping 404 and non-2xx statuses to errors.
    async fn get_ok(&self, url: &str) -> Result<reqwest::Response, ClientError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();

        if status.as_u16() == 404 {
            return Err(ClientError::NotFound);
        }

        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::ServerError {
                status_code: status.as_u16(),
                message,
            });
        }

        Ok(resp)
    }
}
