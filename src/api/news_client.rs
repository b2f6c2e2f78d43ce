//! CryptoPanic headline client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::types::PostsResponse;
use super::HeadlineFeed;

const CRYPTOPANIC_API_BASE: &str = "https://cryptopanic.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the CryptoPanic posts endpoint.
pub struct CryptoPanicClient {
    client: Client,
    base_url: String,
    auth_token: String,
}

impl CryptoPanicClient {
    /// Create a new client with default settings.
    pub fn new(auth_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(CRYPTOPANIC_API_BASE.to_string(), auth_token)
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(base_url: String, auth_token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            auth_token: auth_token.into(),
        })
    }

    /// Fetch the titles of the most recent posts.
    pub async fn get_headlines(&self, limit: u32) -> Result<Vec<String>> {
        let url = format!("{}/api/v1/posts/", self.base_url);

        // The token is a query parameter; keep it out of the logs.
        debug!(url = %url, limit = limit, "Fetching headlines");

        let response = self
            .client
            .get(&url)
            .query(&[("auth_token", self.auth_token.as_str())])
            .query(&[("limit", limit)])
            .send()
            .await
            .context("Failed to fetch headlines")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Headlines request failed: {} - {}", status, body);
        }

        let posts: PostsResponse = response
            .json()
            .await
            .context("Failed to parse headlines response")?;

        Ok(posts
            .results
            .into_iter()
            .map(|p| p.title)
            .filter(|t| !t.is_empty())
            .collect())
    }
}

#[async_trait]
impl HeadlineFeed for CryptoPanicClient {
    async fn recent_headlines(&self, limit: u32) -> Result<Vec<String>> {
        self.get_headlines(limit).await
    }
}
