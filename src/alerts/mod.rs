//! Alert payloads and delivery channels.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::info;

use crate::models::Signal;
use crate::trading::RiskPlan;

mod email;

pub use email::{EmailAlertSink, EmailConfig};

/// A signal together with its risk plan, ready to send.
#[derive(Debug, Clone)]
pub struct Alert {
    pub signal: Signal,
    pub plan: RiskPlan,
    pub created_at: DateTime<Local>,
}

impl Alert {
    pub fn new(signal: Signal, plan: RiskPlan) -> Self {
        Self {
            signal,
            plan,
            created_at: Local::now(),
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "🚨 {} - {} - RSI: {}",
            self.signal.action, self.signal.symbol, self.signal.indicators.rsi
        )
    }

    /// Plain-text alert body.
    pub fn body(&self) -> String {
        let s = &self.signal;
        let p = &self.plan;

        format!(
            "TRADING ALERT\n\n\
             ACTION: {action}\n\
             SYMBOL: {symbol}\n\
             PRICE: ${price:.2}\n\n\
             TECHNICALS:\n\
             • RSI: {rsi} ({zone})\n\
             • TREND: {trend}\n\n\
             RISK MANAGEMENT:\n\
             • Stop Loss: ${stop:.2}\n\
             • Take Profit 1: ${tp1:.2}\n\
             • Take Profit 2: ${tp2:.2}\n\
             • Position Size: ${size:.2}\n\n\
             REASON: {reason}\n\
             TIME: {time}\n\n\
             Execute manually on your preferred exchange.\n",
            action = s.action,
            symbol = s.symbol,
            price = s.price,
            rsi = s.indicators.rsi,
            zone = s.indicators.rsi_zone(),
            trend = s.indicators.trend,
            stop = p.stop_loss,
            tp1 = p.take_profit_1,
            tp2 = p.take_profit_2,
            size = p.position_size,
            reason = s.reason,
            time = self.created_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

/// Channel that delivers alerts to a human.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &Alert) -> Result<()>;
}

/// Sink that only logs alerts (dry runs).
#[derive(Debug, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<()> {
        info!(
            symbol = %alert.signal.symbol,
            action = %alert.signal.action,
            price = %alert.signal.price,
            stop_loss = %alert.plan.stop_loss.round_dp(2),
            position_size = %alert.plan.position_size,
            "[DRY RUN] Would send alert"
        );
        Ok(())
    }
}
