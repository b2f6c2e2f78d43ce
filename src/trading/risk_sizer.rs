//! Stop/target levels and fixed-fractional position sizing for alerts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::SignalAction;
use super::RiskConfig;

/// Risk levels attached to an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskPlan {
    pub stop_loss: Decimal,
    pub take_profit_1: Decimal,
    pub take_profit_2: Decimal,
    /// Suggested notional in quote currency
    pub position_size: Decimal,
}

/// Calculator for stop-loss, take-profit and position size.
pub struct RiskSizer {
    config: RiskConfig,
}

impl RiskSizer {
    /// Create a new risk sizer with given config.
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Build the risk plan for an entry at `entry_price`.
    ///
    /// Levels are mirrored for sells: the stop sits above entry and the
    /// targets below.
    pub fn plan(&self, action: SignalAction, entry_price: Decimal) -> RiskPlan {
        let c = &self.config;
        let (stop_loss, take_profit_1, take_profit_2) = match action {
            SignalAction::Buy => (
                entry_price * (Decimal::ONE - c.stop_loss_pct),
                entry_price * (Decimal::ONE + c.take_profit_1_pct),
                entry_price * (Decimal::ONE + c.take_profit_2_pct),
            ),
            SignalAction::Sell => (
                entry_price * (Decimal::ONE + c.stop_loss_pct),
                entry_price * (Decimal::ONE - c.take_profit_1_pct),
                entry_price * (Decimal::ONE - c.take_profit_2_pct),
            ),
        };

        RiskPlan {
            stop_loss,
            take_profit_1,
            take_profit_2,
            position_size: self.position_size(entry_price, stop_loss),
        }
    }

    /// Fixed fractional sizing.
    ///
    /// size = (portfolio * risk_per_trade) / (|entry - stop| / entry)
    ///
    /// A zero price risk yields a size of zero.
    pub fn position_size(&self, entry_price: Decimal, stop_loss: Decimal) -> Decimal {
        let risk_amount = self.config.portfolio_value * self.config.risk_per_trade;
        let price_risk = (entry_price - stop_loss).abs();

        if price_risk.is_zero() || entry_price.is_zero() {
            return Decimal::ZERO;
        }

        (risk_amount / (price_risk / entry_price)).round_dp(2)
    }
}

impl Default for RiskSizer {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}
