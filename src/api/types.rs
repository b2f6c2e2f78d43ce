//! API response types for the Coinbase and CryptoPanic endpoints.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Spot price response from Coinbase `/v2/prices/{pair}/spot`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotPriceResponse {
    pub data: SpotPriceData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotPriceData {
    /// Decimal encoded as a string, e.g. "64250.12"
    pub amount: Decimal,
}

/// Post listing from CryptoPanic `/api/v1/posts/`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostsResponse {
    #[serde(default)]
    pub results: Vec<PostResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostResponse {
    #[serde(default)]
    pub title: String,
}
