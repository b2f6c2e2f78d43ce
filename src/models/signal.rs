//! Signal model: indicators, trend classification and trade recommendations.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recommended manual action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Buy => "BUY",
            SignalAction::Sell => "SELL",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse trend over the most recent samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
    /// Not enough samples to classify
    Neutral,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Uptrend => "UPTREND",
            Trend::Downtrend => "DOWNTREND",
            Trend::Sideways => "SIDEWAYS",
            Trend::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicators derived from a price history snapshot.
///
/// Always recomputed from scratch; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicators {
    /// Relative Strength Index in [0, 100]
    pub rsi: Decimal,

    /// Short-window trend
    pub trend: Trend,
}

impl Indicators {
    /// Label for the RSI reading used in alert text.
    pub fn rsi_zone(&self) -> &'static str {
        if self.rsi < dec!(30) {
            "OVERSOLD"
        } else if self.rsi > dec!(70) {
            "OVERBOUGHT"
        } else {
            "NEUTRAL"
        }
    }
}

/// Which evaluation rule produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRule {
    /// RSI below the oversold level while trending up
    OversoldInUptrend,
    /// RSI above the overbought level while trending down
    OverboughtInDowntrend,
    /// Primary symbol trading under its price threshold with weak RSI
    PrimaryBelowThreshold,
}

/// A manual-trade recommendation produced within a single cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub action: SignalAction,
    pub price: Decimal,
    pub indicators: Indicators,
    pub rule: SignalRule,
    /// Human-readable explanation for the alert
    pub reason: String,
}
