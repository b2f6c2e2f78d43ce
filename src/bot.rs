//! Bot runner: one analysis cycle, or repeated cycles in watch mode.
//!
//! A cycle moves through:
//! - Credential check (abort if anything is missing)
//! - News gate (halt cleanly on critical headlines)
//! - Paced price fetches into the rolling history
//! - Signal evaluation and alert dispatch
//! - Report

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::alerts::{Alert, AlertSink};
use crate::api::{HeadlineFeed, PriceFeed};
use crate::history::PriceHistoryStore;
use crate::models::{PriceSample, Signal, Trend};
use crate::trading::indicators::{classify_trend, compute_rsi};
use crate::trading::{
    AnalysisConfig, Credentials, Evaluation, NewsGate, RiskConfig, RiskSizer, SignalEvaluator,
};

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Watchlist and rule thresholds
    pub analysis: AnalysisConfig,

    /// Stop/target levels and sizing
    pub risk: RiskConfig,

    /// Seconds between cycles in watch mode
    pub poll_interval_secs: u64,

    /// Log alerts instead of sending them
    pub dry_run: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            risk: RiskConfig::default(),
            poll_interval_secs: 300,
            dry_run: true,
        }
    }
}

/// Why trading was suppressed for a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// Critical headlines found
    BreakingNews(Vec<String>),
    /// News feed failed and the config says to fail closed
    NewsUnavailable(String),
}

/// Terminal state of a cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Credentials missing; nothing was fetched
    Aborted { missing: Vec<&'static str> },
    /// News gate tripped; no trading this cycle
    Halted(HaltReason),
    Completed(CycleSummary),
}

/// What a completed cycle did.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub signals: Vec<Signal>,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
    /// Symbols whose price could not be fetched
    pub skipped: Vec<String>,
    pub report: CycleReport,
}

/// Main bot runner.
pub struct Bot {
    config: BotConfig,
    credentials: Credentials,
    prices: Box<dyn PriceFeed>,
    news: Box<dyn HeadlineFeed>,
    alerts: Box<dyn AlertSink>,

    history: PriceHistoryStore,
    evaluator: SignalEvaluator,
    risk_sizer: RiskSizer,

    // Shutdown signal
    shutdown: Arc<AtomicBool>,
}

impl Bot {
    /// Create a new bot instance.
    pub fn new(
        config: BotConfig,
        credentials: Credentials,
        prices: Box<dyn PriceFeed>,
        news: Box<dyn HeadlineFeed>,
        alerts: Box<dyn AlertSink>,
    ) -> Result<Self> {
        config.analysis.validate()?;

        let history = PriceHistoryStore::new(
            config.analysis.watchlist.iter().cloned(),
            config.analysis.max_history,
        );
        let evaluator = SignalEvaluator::new(config.analysis.clone());
        let risk_sizer = RiskSizer::new(config.risk.clone());

        Ok(Self {
            config,
            credentials,
            prices,
            news,
            alerts,
            history,
            evaluator,
            risk_sizer,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    #[cfg(test)]
    pub fn history(&self) -> &PriceHistoryStore {
        &self.history
    }

    /// Watch mode: run cycles on a fixed interval until Ctrl+C.
    ///
    /// History accumulates across cycles. Stops early if credentials are missing.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            dry_run = self.config.dry_run,
            poll_interval = self.config.poll_interval_secs,
            symbols = self.config.analysis.watchlist.len(),
            "Starting watch loop"
        );

        let mut poll_interval = interval(Duration::from_secs(self.config.poll_interval_secs));

        // Register shutdown handler
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
            shutdown.store(true, Ordering::SeqCst);
        });

        while !self.shutdown.load(Ordering::SeqCst) {
            poll_interval.tick().await;
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match self.run_cycle().await {
                Ok(CycleOutcome::Aborted { .. }) => {
                    error!("Stopping watch loop - missing credentials");
                    break;
                }
                Ok(CycleOutcome::Halted(_)) => {}
                Ok(CycleOutcome::Completed(summary)) => {
                    println!("\n{}", summary.report);
                }
                Err(e) => {
                    error!(error = %e, "Error in analysis cycle");
                }
            }
        }

        info!("Watch loop stopped");
        Ok(())
    }

    /// Run a single analysis cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        debug!("Starting analysis cycle");

        // 1. Credentials
        if !self.credentials.is_complete() {
            let missing = self.credentials.missing();
            error!(missing = ?missing, "Cannot start - missing credentials");
            return Ok(CycleOutcome::Aborted { missing });
        }

        // 2. News gate
        if let Some(reason) = self.check_news().await {
            warn!(reason = ?reason, "Trading halted for this cycle");
            return Ok(CycleOutcome::Halted(reason));
        }

        // 3. Fetch prices, one at a time
        let (fetched, skipped) = self.fetch_prices().await?;

        // 4. Evaluate
        let signals = self.evaluate(&fetched);

        // 5. Dispatch
        let mut alerts_sent = 0;
        let mut alerts_failed = 0;
        for signal in &signals {
            if self.dispatch(signal).await {
                alerts_sent += 1;
            } else {
                alerts_failed += 1;
            }
        }

        // 6. Report
        let report = self.build_report();

        info!(
            signals = signals.len(),
            alerts_sent = alerts_sent,
            alerts_failed = alerts_failed,
            skipped = skipped.len(),
            "Analysis cycle complete"
        );

        Ok(CycleOutcome::Completed(CycleSummary {
            signals,
            alerts_sent,
            alerts_failed,
            skipped,
            report,
        }))
    }

    /// Returns a halt reason if trading must stop this cycle.
    async fn check_news(&self) -> Option<HaltReason> {
        let limit = self.config.analysis.news_headline_limit;

        match self.news.recent_headlines(limit).await {
            Ok(headlines) => {
                if !NewsGate::should_halt(&headlines) {
                    info!(headlines = headlines.len(), "No breaking news found");
                    return None;
                }
                let critical = NewsGate::critical_headlines(&headlines);
                for headline in &critical {
                    warn!(headline = %headline, "Critical news");
                }
                Some(HaltReason::BreakingNews(
                    critical.into_iter().map(str::to_string).collect(),
                ))
            }
            Err(e) if self.config.analysis.halt_on_news_error => {
                warn!(error = %e, "News feed unavailable - failing closed");
                Some(HaltReason::NewsUnavailable(e.to_string()))
            }
            Err(e) => {
                warn!(error = %e, "News feed unavailable - continuing");
                None
            }
        }
    }

    /// Fetch each watched symbol in turn and record successful prices.
    async fn fetch_prices(&mut self) -> Result<(Vec<(String, Decimal)>, Vec<String>)> {
        let delay = Duration::from_millis(self.config.analysis.fetch_delay_ms);
        let mut fetched = Vec::new();
        let mut skipped = Vec::new();

        for (i, symbol) in self.config.analysis.watchlist.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.prices.spot_price(symbol).await {
                Ok(price) => {
                    self.history.append(symbol, PriceSample::now(price))?;
                    info!(symbol = %symbol, price = %price, "Price fetched");
                    fetched.push((symbol.clone(), price));
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Failed to fetch price, skipping");
                    skipped.push(symbol.clone());
                }
            }
        }

        Ok((fetched, skipped))
    }

    fn evaluate(&self, fetched: &[(String, Decimal)]) -> Vec<Signal> {
        let mut signals = Vec::new();

        for (symbol, price) in fetched {
            let history = self.history.prices(symbol);

            match self.evaluator.evaluate(symbol, *price, &history) {
                Evaluation::CollectingData { samples } => {
                    info!(symbol = %symbol, samples = samples, "Collecting more data for analysis");
                }
                Evaluation::NoSignal(ind) => {
                    info!(symbol = %symbol, rsi = %ind.rsi, trend = %ind.trend, "No signal");
                }
                Evaluation::Signal(signal) => {
                    info!(
                        symbol = %symbol,
                        action = %signal.action,
                        price = %price,
                        rsi = %signal.indicators.rsi,
                        trend = %signal.indicators.trend,
                        "Signal generated"
                    );
                    signals.push(signal);
                }
            }
        }

        signals
    }

    /// Attach a risk plan and hand the alert to the sink. Failures are logged only.
    async fn dispatch(&self, signal: &Signal) -> bool {
        let plan = self.risk_sizer.plan(signal.action, signal.price);
        let alert = Alert::new(signal.clone(), plan);

        match self.alerts.deliver(&alert).await {
            Ok(()) => true,
            Err(e) => {
                error!(symbol = %signal.symbol, error = %e, "Alert delivery failed");
                false
            }
        }
    }

    /// Snapshot of every watched symbol.
    pub fn build_report(&self) -> CycleReport {
        let rsi_period = self.config.analysis.rsi_period;

        let rows = self
            .config
            .analysis
            .watchlist
            .iter()
            .map(|symbol| {
                let prices = self.history.prices(symbol);
                let rsi = self
                    .evaluator
                    .is_ready(prices.len())
                    .then(|| compute_rsi(&prices, rsi_period));

                SymbolReport {
                    symbol: symbol.clone(),
                    price: self.history.latest(symbol).map(|s| s.price),
                    rsi,
                    trend: classify_trend(&prices),
                    samples: prices.len(),
                }
            })
            .collect();

        CycleReport {
            rows,
            generated_at: Local::now(),
        }
    }
}

/// One report line.
#[derive(Debug, Clone)]
pub struct SymbolReport {
    pub symbol: String,
    pub price: Option<Decimal>,
    /// `None` until the symbol has enough samples
    pub rsi: Option<Decimal>,
    pub trend: Trend,
    pub samples: usize,
}

/// Per-cycle textual report.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub rows: Vec<SymbolReport>,
    pub generated_at: DateTime<Local>,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Watchlist Report ===")?;
        for row in &self.rows {
            writeln!(f, "{}:", row.symbol)?;
            match row.price {
                Some(price) => writeln!(f, "  Price:       ${:.2}", price)?,
                None => writeln!(f, "  Price:       no data")?,
            }
            match row.rsi {
                Some(rsi) => writeln!(f, "  RSI:         {}", rsi)?,
                None => writeln!(f, "  RSI:         not enough data")?,
            }
            writeln!(f, "  Trend:       {}", row.trend)?;
            writeln!(f, "  Data Points: {}", row.samples)?;
        }
        write!(
            f,
            "Report Time: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SignalAction, SignalRule};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Replays a fixed price script per symbol; `None` entries fail.
    #[derive(Default)]
    struct ScriptedPrices {
        scripts: Mutex<HashMap<String, VecDeque<Option<Decimal>>>>,
        calls: Arc<Mutex<usize>>,
    }

    impl ScriptedPrices {
        fn with(mut self, symbol: &str, script: Vec<Option<Decimal>>) -> Self {
            self.scripts
                .get_mut()
                .unwrap()
                .insert(symbol.to_string(), script.into());
            self
        }
    }

    #[async_trait]
    impl PriceFeed for ScriptedPrices {
        async fn spot_price(&self, symbol: &str) -> Result<Decimal> {
            *self.calls.lock().unwrap() += 1;
            self.scripts
                .lock()
                .unwrap()
                .get_mut(symbol)
                .and_then(|s| s.pop_front())
                .flatten()
                .ok_or_else(|| anyhow!("timeout fetching {}", symbol))
        }
    }

    struct StaticNews(Option<Vec<String>>);

    #[async_trait]
    impl HeadlineFeed for StaticNews {
        async fn recent_headlines(&self, _limit: u32) -> Result<Vec<String>> {
            self.0.clone().ok_or_else(|| anyhow!("news feed down"))
        }
    }

    fn quiet_news() -> Box<StaticNews> {
        Box::new(StaticNews(Some(vec!["Market hits new high".to_string()])))
    }

    /// Records alerts; fails delivery for symbols listed in `fail_for`.
    #[derive(Default, Clone)]
    struct RecordingSink {
        delivered: Arc<Mutex<Vec<Alert>>>,
        fail_for: Vec<String>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn deliver(&self, alert: &Alert) -> Result<()> {
            if self.fail_for.contains(&alert.signal.symbol) {
                return Err(anyhow!("smtp unavailable"));
            }
            self.delivered.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    fn config() -> BotConfig {
        let mut config = BotConfig::default();
        config.analysis.fetch_delay_ms = 0;
        config
    }

    fn creds() -> Credentials {
        Credentials::new("token", "bot@example.com", "password")
    }

    fn dec_series(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|&v| Decimal::from(v)).collect()
    }

    /// Falls from 100 to 70 in steps of 2, then recovers to 74.
    fn dip_then_recovery() -> Vec<Decimal> {
        let mut prices: Vec<Decimal> = (0..16i64).map(|i| Decimal::from(100 - 2 * i)).collect();
        prices.extend(dec_series(&[71, 72, 73, 74]));
        prices
    }

    fn seed(bot: &mut Bot, symbol: &str, prices: &[Decimal]) {
        for &price in prices {
            bot.history.append(symbol, PriceSample::now(price)).unwrap();
        }
    }

    fn completed(outcome: CycleOutcome) -> CycleSummary {
        match outcome {
            CycleOutcome::Completed(summary) => summary,
            other => panic!("expected completed cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_single_buy_for_recovering_symbol() {
        let history = dip_then_recovery();
        let prices = ScriptedPrices::default()
            .with("BTC-USD", vec![Some(history[19])])
            .with("ETH-USD", vec![Some(dec!(3000))])
            .with("BNB-USD", vec![Some(dec!(550))]);
        let sink = RecordingSink::default();

        let mut bot = Bot::new(config(), creds(), Box::new(prices), quiet_news(), Box::new(sink.clone())).unwrap();
        seed(&mut bot, "BTC-USD", &history[..19]);

        let summary = completed(tokio_test::block_on(bot.run_cycle()).unwrap());

        assert_eq!(summary.signals.len(), 1);
        let signal = &summary.signals[0];
        assert_eq!(signal.symbol, "BTC-USD");
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.rule, SignalRule::OversoldInUptrend);
        assert_eq!(signal.indicators.rsi, dec!(16.67));
        assert_eq!(signal.indicators.trend, Trend::Uptrend);

        assert_eq!(summary.alerts_sent, 1);
        assert_eq!(summary.alerts_failed, 0);
        assert!(summary.skipped.is_empty());

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].plan.stop_loss, dec!(74) * dec!(0.97));
        assert_eq!(delivered[0].plan.position_size, dec!(666.67));
    }

    #[test]
    fn test_history_accumulates_across_cycles() {
        let history = dip_then_recovery();
        let prices = ScriptedPrices::default()
            .with("BTC-USD", history.iter().copied().map(Some).collect());
        let sink = RecordingSink::default();

        let mut bot = Bot::new(config(), creds(), Box::new(prices), quiet_news(), Box::new(sink.clone())).unwrap();

        let mut first_signal_cycle = None;
        for cycle in 1..=20 {
            let summary = completed(tokio_test::block_on(bot.run_cycle()).unwrap());
            assert_eq!(summary.skipped, vec!["ETH-USD".to_string(), "BNB-USD".to_string()]);
            if !summary.signals.is_empty() && first_signal_cycle.is_none() {
                first_signal_cycle = Some(cycle);
            }
        }

        // Trend over the last five only turns up once 73 prints
        assert_eq!(first_signal_cycle, Some(19));
        assert_eq!(bot.history().len("BTC-USD"), 20);
        assert_eq!(bot.history().len("ETH-USD"), 0);
        assert!(sink.delivered.lock().unwrap().iter().all(|a| a.signal.symbol == "BTC-USD"));
    }

    #[test]
    fn test_missing_credentials_abort() {
        let prices = ScriptedPrices::default().with("BTC-USD", vec![Some(dec!(1))]);
        let calls = prices.calls.clone();
        let credentials = Credentials {
            email_password: None,
            ..creds()
        };

        let mut bot = Bot::new(config(), credentials, Box::new(prices), quiet_news(), Box::new(RecordingSink::default())).unwrap();

        match tokio_test::block_on(bot.run_cycle()).unwrap() {
            CycleOutcome::Aborted { missing } => assert_eq!(missing, vec!["ALERT_EMAIL_PASSWORD"]),
            other => panic!("expected abort, got {:?}", other),
        }
        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(bot.history().is_empty("BTC-USD"));
    }

    #[test]
    fn test_missing_email_address_aborts() {
        let prices = ScriptedPrices::default().with("BTC-USD", vec![Some(dec!(1))]);
        let calls = prices.calls.clone();
        let credentials = Credentials {
            email_address: None,
            ..creds()
        };

        let mut bot = Bot::new(config(), credentials, Box::new(prices), quiet_news(), Box::new(RecordingSink::default())).unwrap();

        match tokio_test::block_on(bot.run_cycle()).unwrap() {
            CycleOutcome::Aborted { missing } => assert_eq!(missing, vec!["ALERT_EMAIL_ADDRESS"]),
            other => panic!("expected abort, got {:?}", other),
        }
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_breaking_news_halts_before_fetching() {
        let prices = ScriptedPrices::default().with("BTC-USD", vec![Some(dec!(1))]);
        let calls = prices.calls.clone();
        let news = StaticNews(Some(vec![
            "Bitcoin steady".to_string(),
            "Fed raises rates".to_string(),
        ]));

        let mut bot = Bot::new(config(), creds(), Box::new(prices), Box::new(news), Box::new(RecordingSink::default())).unwrap();

        match tokio_test::block_on(bot.run_cycle()).unwrap() {
            CycleOutcome::Halted(HaltReason::BreakingNews(headlines)) => {
                assert_eq!(headlines, vec!["Fed raises rates".to_string()]);
            }
            other => panic!("expected halt, got {:?}", other),
        }
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_news_failure_fails_open_by_default() {
        let prices = ScriptedPrices::default().with("BTC-USD", vec![Some(dec!(1))]);
        let mut bot = Bot::new(config(), creds(), Box::new(prices), Box::new(StaticNews(None)), Box::new(RecordingSink::default())).unwrap();

        let summary = completed(tokio_test::block_on(bot.run_cycle()).unwrap());
        assert_eq!(summary.skipped.len(), 2);
        assert_eq!(bot.history().len("BTC-USD"), 1);
    }

    #[test]
    fn test_news_failure_can_fail_closed() {
        let mut config = config();
        config.analysis.halt_on_news_error = true;
        let prices = ScriptedPrices::default().with("BTC-USD", vec![Some(dec!(1))]);
        let mut bot = Bot::new(config, creds(), Box::new(prices), Box::new(StaticNews(None)), Box::new(RecordingSink::default())).unwrap();

        let outcome = tokio_test::block_on(bot.run_cycle()).unwrap();
        assert!(matches!(outcome, CycleOutcome::Halted(HaltReason::NewsUnavailable(_))));
        assert!(bot.history().is_empty("BTC-USD"));
    }

    #[test]
    fn test_delivery_failure_is_isolated() {
        let history = dip_then_recovery();
        let prices = ScriptedPrices::default()
            .with("BTC-USD", vec![Some(history[19])])
            .with("ETH-USD", vec![Some(history[19])]);
        let sink = RecordingSink {
            fail_for: vec!["BTC-USD".to_string()],
            ..Default::default()
        };

        let mut bot = Bot::new(config(), creds(), Box::new(prices), quiet_news(), Box::new(sink.clone())).unwrap();
        seed(&mut bot, "BTC-USD", &history[..19]);
        seed(&mut bot, "ETH-USD", &history[..19]);

        let summary = completed(tokio_test::block_on(bot.run_cycle()).unwrap());
        assert_eq!(summary.signals.len(), 2);
        assert_eq!(summary.alerts_sent, 1);
        assert_eq!(summary.alerts_failed, 1);
        assert_eq!(summary.skipped, vec!["BNB-USD".to_string()]);

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered[0].signal.symbol, "ETH-USD");
    }

    #[test]
    fn test_primary_threshold_signal() {
        // Gently falling primary under $600: RSI 0, downtrend, rule 3 applies
        let falling: Vec<Decimal> = (0..15i64).map(|i| dec!(590) - Decimal::from(i)).collect();
        let prices = ScriptedPrices::default().with("BNB-USD", vec![Some(dec!(575))]);

        let mut bot = Bot::new(config(), creds(), Box::new(prices), quiet_news(), Box::new(RecordingSink::default())).unwrap();
        seed(&mut bot, "BNB-USD", &falling);

        let summary = completed(tokio_test::block_on(bot.run_cycle()).unwrap());
        assert_eq!(summary.signals.len(), 1);
        assert_eq!(summary.signals[0].rule, SignalRule::PrimaryBelowThreshold);
        assert_eq!(summary.signals[0].symbol, "BNB-USD");
    }

    #[test]
    fn test_report_lines() {
        let prices = ScriptedPrices::default().with("ETH-USD", vec![Some(dec!(3012.5))]);
        let mut bot = Bot::new(config(), creds(), Box::new(prices), quiet_news(), Box::new(RecordingSink::default())).unwrap();
        seed(&mut bot, "BTC-USD", &dip_then_recovery());

        let summary = completed(tokio_test::block_on(bot.run_cycle()).unwrap());
        let report = &summary.report;

        let btc = &report.rows[0];
        assert_eq!(btc.samples, 20);
        assert_eq!(btc.rsi, Some(dec!(16.67)));
        assert_eq!(btc.price, Some(dec!(74)));

        let eth = &report.rows[1];
        assert_eq!(eth.samples, 1);
        assert_eq!(eth.rsi, None);
        assert_eq!(eth.trend, Trend::Neutral);

        let text = report.to_string();
        assert!(text.contains("BTC-USD:"));
        assert!(text.contains("RSI:         16.67"));
        assert!(text.contains("Price:       $3012.50"));
        assert!(text.contains("not enough data"));
        assert!(text.contains("Data Points: 20"));
        assert!(text.contains("Price:       no data"));
    }

    #[test]
    fn test_invalid_watchlist_is_rejected() {
        let mut config = config();
        config.analysis.primary_symbol = "SOL-USD".to_string();
        let result = Bot::new(config, creds(), Box::new(ScriptedPrices::default()), quiet_news(), Box::new(RecordingSink::default()));
        assert!(result.is_err());
    }
}
