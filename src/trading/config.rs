//! Analysis, risk and credential configuration.

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::history::MAX_HISTORY;
use super::indicators::RSI_PERIOD;

/// Environment variable holding the CryptoPanic API token.
pub const NEWS_TOKEN_VAR: &str = "CRYPTOPANIC_TOKEN";
/// Environment variable holding the sender/login address for alert emails.
pub const EMAIL_ADDRESS_VAR: &str = "ALERT_EMAIL_ADDRESS";
/// Environment variable holding the SMTP password for alert emails.
pub const EMAIL_PASSWORD_VAR: &str = "ALERT_EMAIL_PASSWORD";

/// Configuration for the watchlist and signal rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Symbols sampled every cycle (e.g. "BTC-USD")
    pub watchlist: Vec<String>,

    /// The one symbol eligible for the absolute price threshold rule
    pub primary_symbol: String,

    /// Maximum samples kept per symbol
    pub max_history: usize,

    /// Lookback for RSI
    pub rsi_period: usize,

    /// Samples required before a symbol is evaluated at all
    pub min_samples: usize,

    /// RSI below this is oversold
    pub oversold_rsi: Decimal,

    /// RSI above this is overbought
    pub overbought_rsi: Decimal,

    /// Primary symbol price below which the threshold rule may fire
    pub primary_price_threshold: Decimal,

    /// RSI ceiling for the primary threshold rule
    pub primary_max_rsi: Decimal,

    /// Number of headlines requested from the news feed
    pub news_headline_limit: u32,

    /// Pause between successive price fetches (milliseconds)
    pub fetch_delay_ms: u64,

    /// Halt trading when the news feed cannot be read
    pub halt_on_news_error: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            watchlist: vec![
                "BTC-USD".to_string(),
                "ETH-USD".to_string(),
                "BNB-USD".to_string(),
            ],
            primary_symbol: "BNB-USD".to_string(),
            max_history: MAX_HISTORY,
            rsi_period: RSI_PERIOD,
            min_samples: 15,
            oversold_rsi: dec!(30),
            overbought_rsi: dec!(70),
            primary_price_threshold: dec!(600),
            primary_max_rsi: dec!(40),
            news_headline_limit: 5,
            fetch_delay_ms: 1000,    // 1s courtesy delay
            halt_on_news_error: false, // fail-open
        }
    }
}

impl AnalysisConfig {
    /// Defaults overridden by `WATCHLIST` (comma separated), `PRIMARY_SYMBOL`
    /// and `HALT_ON_NEWS_ERROR`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(list) = std::env::var("WATCHLIST") {
            config.watchlist = list
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(primary) = std::env::var("PRIMARY_SYMBOL") {
            config.primary_symbol = primary.trim().to_uppercase();
        }
        if let Ok(flag) = std::env::var("HALT_ON_NEWS_ERROR") {
            config.halt_on_news_error = matches!(
                flag.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the watchlist is usable.
    pub fn validate(&self) -> Result<()> {
        if self.watchlist.is_empty() {
            bail!("Watchlist is empty");
        }
        if !self.watchlist.contains(&self.primary_symbol) {
            bail!(
                "Primary symbol {} is not on the watchlist",
                self.primary_symbol
            );
        }
        if self.max_history < self.min_samples {
            bail!(
                "History capacity {} is below the readiness threshold {}",
                self.max_history,
                self.min_samples
            );
        }
        Ok(())
    }

    pub fn is_primary(&self, symbol: &str) -> bool {
        self.primary_symbol == symbol
    }
}

/// Configuration for stop/target levels and position sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Notional portfolio value used for sizing
    pub portfolio_value: Decimal,

    /// Fraction of the portfolio risked per trade
    pub risk_per_trade: Decimal,

    /// Distance from entry to stop loss (fraction)
    pub stop_loss_pct: Decimal,

    /// Distance from entry to the first target (fraction)
    pub take_profit_1_pct: Decimal,

    /// Distance from entry to the second target (fraction)
    pub take_profit_2_pct: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            portfolio_value: dec!(1000),   // Demo portfolio
            risk_per_trade: dec!(0.02),    // 2% per trade
            stop_loss_pct: dec!(0.03),     // 3% stop
            take_profit_1_pct: dec!(0.03), // 3% first target
            take_profit_2_pct: dec!(0.06), // 6% second target
        }
    }
}

/// Secrets required before a cycle may start.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub news_token: Option<String>,
    pub email_address: Option<String>,
    pub email_password: Option<String>,
}

impl Credentials {
    pub fn new(
        news_token: impl Into<String>,
        email_address: impl Into<String>,
        email_password: impl Into<String>,
    ) -> Self {
        Self {
            news_token: Some(news_token.into()),
            email_address: Some(email_address.into()),
            email_password: Some(email_password.into()),
        }
    }

    /// Read credentials from the environment. Missing values are kept as `None`
    /// and reported by [`Credentials::missing`].
    pub fn from_env() -> Self {
        Self {
            news_token: non_empty_var(NEWS_TOKEN_VAR),
            email_address: non_empty_var(EMAIL_ADDRESS_VAR),
            email_password: non_empty_var(EMAIL_PASSWORD_VAR),
        }
    }

    /// Names of the variables that are not set.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.news_token.is_none() {
            missing.push(NEWS_TOKEN_VAR);
        }
        if self.email_address.is_none() {
            missing.push(EMAIL_ADDRESS_VAR);
        }
        if self.email_password.is_none() {
            missing.push(EMAIL_PASSWORD_VAR);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
