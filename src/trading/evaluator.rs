//! Signal rules mapping price and indicators to a manual-trade recommendation.
//!
//! Rules are checked in priority order and the first match wins:
//! 1. Oversold in an uptrend -> BUY
//! 2. Overbought in a downtrend -> SELL
//! 3. Primary symbol below its price threshold with weak RSI -> BUY

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{Indicators, Signal, SignalAction, SignalRule, Trend};
use super::indicators::compute_indicators;
use super::AnalysisConfig;

/// Result of evaluating one symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Not enough history yet
    CollectingData { samples: usize },
    /// Indicators computed, no rule matched
    NoSignal(Indicators),
    /// A rule matched
    Signal(Signal),
}

impl Evaluation {
    #[cfg(test)]
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Evaluation::Signal(s) => Some(s),
            _ => None,
        }
    }
}

/// Rule engine for the watchlist.
pub struct SignalEvaluator {
    config: AnalysisConfig,
}

impl SignalEvaluator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Whether a history of `samples` points is long enough to evaluate.
    pub fn is_ready(&self, samples: usize) -> bool {
        samples >= self.config.min_samples
    }

    /// Evaluate a symbol from its price history (oldest first).
    pub fn evaluate(&self, symbol: &str, current_price: Decimal, history: &[Decimal]) -> Evaluation {
        if !self.is_ready(history.len()) {
            debug!(symbol = %symbol, samples = history.len(), "Collecting more data");
            return Evaluation::CollectingData {
                samples: history.len(),
            };
        }

        let indicators = compute_indicators(history, self.config.rsi_period);
        match self.apply_rules(symbol, current_price, &indicators) {
            Some(signal) => Evaluation::Signal(signal),
            None => Evaluation::NoSignal(indicators),
        }
    }

    /// Apply the rules to already computed indicators.
    pub fn apply_rules(
        &self,
        symbol: &str,
        current_price: Decimal,
        indicators: &Indicators,
    ) -> Option<Signal> {
        let c = &self.config;
        let rsi = indicators.rsi;

        let (action, rule, reason) = if rsi < c.oversold_rsi && indicators.trend == Trend::Uptrend {
            (
                SignalAction::Buy,
                SignalRule::OversoldInUptrend,
                format!("Oversold in uptrend (RSI: {})", rsi),
            )
        } else if rsi > c.overbought_rsi && indicators.trend == Trend::Downtrend {
            (
                SignalAction::Sell,
                SignalRule::OverboughtInDowntrend,
                format!("Overbought in downtrend (RSI: {})", rsi),
            )
        } else if c.is_primary(symbol)
            && current_price < c.primary_price_threshold
            && rsi < c.primary_max_rsi
        {
            (
                SignalAction::Buy,
                SignalRule::PrimaryBelowThreshold,
                format!(
                    "Price below threshold ${} with low RSI (RSI: {})",
                    c.primary_price_threshold, rsi
                ),
            )
        } else {
            return None;
        };

        Some(Signal {
            symbol: symbol.to_string(),
            action,
            price: current_price,
            indicators: *indicators,
            rule,
            reason,
        })
    }
}
