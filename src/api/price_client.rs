//! Coinbase spot price client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::debug;

use super::types::SpotPriceResponse;
use super::PriceFeed;

const COINBASE_API_BASE: &str = "https://api.coinbase.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the public Coinbase price endpoint (no auth).
pub struct CoinbaseClient {
    client: Client,
    base_url: String,
}

impl CoinbaseClient {
    /// Create a new client with default settings.
    pub fn new() -> Result<Self> {
        Self::with_base_url(COINBASE_API_BASE.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Fetch the spot price for a pair such as "BTC-USD".
    pub async fn get_spot_price(&self, symbol: &str) -> Result<Decimal> {
        let url = format!("{}/v2/prices/{}/spot", self.base_url, symbol);

        debug!(url = %url, "Fetching spot price");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch spot price for {}", symbol))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Spot price request failed: {} - {}", status, body);
        }

        let parsed: SpotPriceResponse = response
            .json()
            .await
            .context("Failed to parse spot price response")?;

        let price = parsed.data.amount;
        if price <= Decimal::ZERO {
            anyhow::bail!("Non-positive spot price for {}: {}", symbol, price);
        }

        Ok(price)
    }
}

#[async_trait]
impl PriceFeed for CoinbaseClient {
    async fn spot_price(&self, symbol: &str) -> Result<Decimal> {
        self.get_spot_price(symbol).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::serve_once;
    use rust_decimal_macros::dec;

    fn fetch(status: &'static str, body: &str) -> Result<Decimal> {
        let body = body.to_string();
        tokio_test::block_on(async move {
            let base_url = serve_once(status, body).await;
            CoinbaseClient::with_base_url(base_url)?
                .get_spot_price("BTC-USD")
                .await
        })
    }

    #[test]
    fn test_spot_price_is_parsed() {
        let price = fetch("200 OK", r#"{"data":{"amount":"64250.12","base":"BTC","currency":"USD"}}"#).unwrap();
        assert_eq!(price, dec!(64250.12));
    }

    #[test]
    fn test_zero_price_is_rejected() {
        let err = fetch("200 OK", r#"{"data":{"amount":"0","base":"BTC","currency":"USD"}}"#).unwrap_err();
        assert!(err.to_string().contains("Non-positive spot price"));
    }

    #[test]
    fn test_server_error_is_rejected() {
        let err = fetch("500 Internal Server Error", r#"{"errors":[]}"#).unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
