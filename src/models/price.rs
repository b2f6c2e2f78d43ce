//! Price sample recorded for a watched symbol.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single spot price observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    /// When the price was observed
    pub timestamp: DateTime<Utc>,

    /// Spot price in quote currency (always positive)
    pub price: Decimal,
}

impl PriceSample {
    /// Create a sample stamped with the current time.
    pub fn now(price: Decimal) -> Self {
        Self::at(Utc::now(), price)
    }

    pub fn at(timestamp: DateTime<Utc>, price: Decimal) -> Self {
        Self { timestamp, price }
    }
}
