//! Market data clients: spot prices and news headlines.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

mod news_client;
mod price_client;
#[cfg(test)]
mod testing;
mod types;

pub use news_client::CryptoPanicClient;
pub use price_client::CoinbaseClient;

/// Source of current spot prices.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current positive spot price for a symbol such as "BTC-USD".
    async fn spot_price(&self, symbol: &str) -> Result<Decimal>;
}

/// Source of recent news headlines.
#[async_trait]
pub trait HeadlineFeed: Send + Sync {
    async fn recent_headlines(&self, limit: u32) -> Result<Vec<String>>;
}
