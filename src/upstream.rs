// src/upstream.rs

//! Client for the upstream recipe service
//!
//! The upstream exposes the same `/v1` surface this server does. Searches are
//! merged with local results; downloads and unknown `/v1` paths are redirected
//! to it.

use crate::error::{Error, Result};
use crate::recipe::RecipeId;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = concat!("larder/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one upstream base URL
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    /// Build a client with its own connection pool and request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Share an existing client
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Query the upstream search endpoint
    ///
    /// A JSON `null` body counts as no results. Any other non-array body is an
    /// error.
    pub async fn search(&self, needle: &str) -> Result<Vec<Value>> {
        let url = format!("{}/v1/recipes/search", self.base_url);
        debug!("Searching upstream {} for '{}'", url, needle);

        let response = self
            .client
            .get(&url)
            .query(&[("needle", needle)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Search returned status {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        let results: Option<Vec<Value>> = serde_json::from_slice(&body)?;
        Ok(results.unwrap_or_default())
    }

    /// Upstream download location, with the id percent-encoded as one path segment
    pub fn download_url(&self, id: &RecipeId) -> String {
        if let Ok(mut url) = url::Url::parse(&self.base_url) {
            let joined = url
                .path_segments_mut()
                .map(|mut segments| {
                    segments
                        .pop_if_empty()
                        .extend(["v1", "recipes", "download", id.as_str()]);
                })
                .is_ok();
            if joined {
                return url.to_string();
            }
        }
        format!("{}/v1/recipes/download/{}", self.base_url, id)
    }

    /// Upstream location for a request path (with query) this server does not handle
    pub fn passthrough_url(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.base_url, path_and_query)
        } else {
            format!("{}/{}", self.base_url, path_and_query)
        }
    }
}
