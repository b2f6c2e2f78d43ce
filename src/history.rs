//! Bounded per-symbol price history.
//!
//! The store is owned by the bot; readers only ever get copies.

use std::collections::{HashMap, VecDeque};

use anyhow::{bail, Result};
use rust_decimal::Decimal;

use crate::models::PriceSample;

/// Default number of samples retained per symbol.
pub const MAX_HISTORY: usize = 50;

/// Rolling, insertion-ordered price log for a fixed watchlist.
#[derive(Debug, Clone)]
pub struct PriceHistoryStore {
    capacity: usize,
    histories: HashMap<String, VecDeque<PriceSample>>,
}

impl PriceHistoryStore {
    /// Create an empty history for each watched symbol.
    pub fn new<I, S>(symbols: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let histories = symbols
            .into_iter()
            .map(|s| (s.into(), VecDeque::with_capacity(capacity + 1)))
            .collect();
        Self {
            capacity,
            histories,
        }
    }

    /// Append a sample, evicting the oldest one once capacity is exceeded.
    ///
    /// Symbols are fixed at construction; an unknown symbol is rejected.
    pub fn append(&mut self, symbol: &str, sample: PriceSample) -> Result<()> {
        let Some(history) = self.histories.get_mut(symbol) else {
            bail!("Symbol {} is not on the watchlist", symbol);
        };

        history.push_back(sample);
        if history.len() > self.capacity {
            history.pop_front();
        }
        Ok(())
    }

    /// Ordered copy of the samples for a symbol (oldest first).
    pub fn snapshot(&self, symbol: &str) -> Vec<PriceSample> {
        self.histories
            .get(symbol)
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Prices only, in the shape the indicator functions expect.
    pub fn prices(&self, symbol: &str) -> Vec<Decimal> {
        self.snapshot(symbol).into_iter().map(|s| s.price).collect()
    }

    pub fn latest(&self, symbol: &str) -> Option<PriceSample> {
        self.histories.get(symbol).and_then(|h| h.back().copied())
    }

    pub fn len(&self, symbol: &str) -> usize {
        self.histories.get(symbol).map_or(0, VecDeque::len)
    }

    #[cfg(test)]
    pub fn is_empty(&self, symbol: &str) -> bool {
        self.len(symbol) == 0
    }

    #[cfg(test)]
    pub fn contains(&self, symbol: &str) -> bool {
        self.histories.contains_key(symbol)
    }
}
