//! Crypto watchlist alert bot
//!
//! Samples spot prices, derives RSI and trend signals, and emails
//! manual-trade alerts unless breaking news halts trading.

mod alerts;
mod api;
mod bot;
mod history;
mod models;
mod trading;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::alerts::{AlertSink, EmailAlertSink, EmailConfig, LogAlertSink};
use crate::api::{CoinbaseClient, CryptoPanicClient};
use crate::bot::{Bot, BotConfig, CycleOutcome, HaltReason};
use crate::trading::{
    AnalysisConfig, Credentials, NewsGate, RiskConfig, CRITICAL_KEYWORDS, NEWS_TOKEN_VAR,
};

/// Crypto watchlist alert bot CLI.
#[derive(Parser)]
#[command(name = "cryptowatch")]
#[command(about = "RSI/trend alerts for a crypto watchlist with a news kill switch", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single analysis cycle
    Run {
        /// Log alerts instead of emailing them
        #[arg(long)]
        dry_run: bool,

        /// Pause between price fetches in milliseconds
        #[arg(long, default_value = "1000")]
        fetch_delay_ms: u64,
    },

    /// Run analysis cycles repeatedly, keeping price history between them
    Watch {
        /// Seconds between cycles
        #[arg(short, long, default_value = "300", value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Log alerts instead of emailing them
        #[arg(long)]
        dry_run: bool,

        /// Pause between price fetches in milliseconds
        #[arg(long, default_value = "1000")]
        fetch_delay_ms: u64,
    },

    /// Fetch recent headlines and show the news gate verdict
    News {
        /// Number of headlines to request
        #[arg(short, long, default_value = "5")]
        limit: u32,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let analysis = AnalysisConfig::from_env()?;

    match cli.command {
        Commands::Run {
            dry_run,
            fetch_delay_ms,
        } => {
            let config = BotConfig {
                analysis: AnalysisConfig {
                    fetch_delay_ms,
                    ..analysis
                },
                risk: RiskConfig::default(),
                dry_run,
                ..Default::default()
            };

            info!(dry_run = dry_run, "Starting analysis");
            let mut bot = build_bot(config)?;

            match bot.run_cycle().await? {
                CycleOutcome::Aborted { missing } => {
                    println!("Cannot start - missing credentials: {}", missing.join(", "));
                }
                CycleOutcome::Halted(HaltReason::BreakingNews(headlines)) => {
                    println!("Breaking news detected - no trading");
                    for headline in headlines {
                        println!("  ! {}", headline);
                    }
                }
                CycleOutcome::Halted(HaltReason::NewsUnavailable(e)) => {
                    println!("News check failed ({}) - no trading", e);
                }
                CycleOutcome::Completed(summary) => {
                    println!("\n{}", summary.report);
                    println!(
                        "\nAnalysis complete: {} signal(s), {} alert(s) sent, {} failed.",
                        summary.signals.len(),
                        summary.alerts_sent,
                        summary.alerts_failed
                    );
                    if !summary.skipped.is_empty() {
                        println!("Skipped (fetch failed): {}", summary.skipped.join(", "));
                    }
                }
            }
        }

        Commands::Watch {
            interval,
            dry_run,
            fetch_delay_ms,
        } => {
            let config = BotConfig {
                analysis: AnalysisConfig {
                    fetch_delay_ms,
                    ..analysis
                },
                risk: RiskConfig::default(),
                poll_interval_secs: interval,
                dry_run,
            };

            let mut bot = build_bot(config)?;

            println!("\n=== Crypto Watchlist Bot ===");
            println!("Polling interval: {}s", interval);
            println!("Mode: {}", if dry_run { "DRY RUN (alerts logged only)" } else { "EMAIL ALERTS" });
            println!("\nPress Ctrl+C to stop.\n");

            bot.run().await?;
        }

        Commands::News { limit } => {
            let credentials = Credentials::from_env();
            let token = credentials
                .news_token
                .with_context(|| format!("{} not set", NEWS_TOKEN_VAR))?;
            let client = CryptoPanicClient::new(token)?;

            let headlines = client.get_headlines(limit).await?;
            let critical = NewsGate::critical_headlines(&headlines);

            println!("\n=== Latest Headlines ({}) ===", headlines.len());
            for headline in &headlines {
                let marker = if critical.contains(&headline.as_str()) { "!" } else { " " };
                println!("{} {}", marker, headline);
            }
            println!(
                "\nVerdict: {}",
                if critical.is_empty() { "clear to trade" } else { "HALT trading" }
            );
        }

        Commands::Config => {
            let risk = RiskConfig::default();

            println!("\n=== Analysis Configuration ===\n");
            println!("Watchlist:");
            println!("  Symbols:              {}", analysis.watchlist.join(", "));
            println!("  Primary Symbol:       {}", analysis.primary_symbol);
            println!("  Max History:          {}", analysis.max_history);
            println!("  Fetch Delay:          {}ms", analysis.fetch_delay_ms);

            println!("\nSignal Rules:");
            println!("  RSI Period:           {}", analysis.rsi_period);
            println!("  Min Samples:          {}", analysis.min_samples);
            println!("  Oversold RSI:         < {}", analysis.oversold_rsi);
            println!("  Overbought RSI:       > {}", analysis.overbought_rsi);
            println!("  Primary Threshold:    < ${} with RSI < {}", analysis.primary_price_threshold, analysis.primary_max_rsi);

            println!("\nNews Gate:");
            println!("  Headlines Checked:    {}", analysis.news_headline_limit);
            println!("  Keywords:             {}", CRITICAL_KEYWORDS.join(", "));
            println!("  On Feed Error:        {}", if analysis.halt_on_news_error { "halt" } else { "continue" });

            println!("\n=== Risk Configuration ===\n");
            println!("  Portfolio Value:      ${}", risk.portfolio_value);
            println!("  Risk Per Trade:       {}%", risk.risk_per_trade * dec!(100));
            println!("  Stop Loss:            {}%", risk.stop_loss_pct * dec!(100));
            println!("  Take Profit 1:        {}%", risk.take_profit_1_pct * dec!(100));
            println!("  Take Profit 2:        {}%", risk.take_profit_2_pct * dec!(100));
        }
    }

    Ok(())
}

/// Wire the live Coinbase, CryptoPanic and SMTP collaborators into a bot.
fn build_bot(config: BotConfig) -> Result<Bot> {
    let credentials = Credentials::from_env();

    let prices = CoinbaseClient::new()?;
    let news = CryptoPanicClient::new(credentials.news_token.clone().unwrap_or_default())?;

    // Missing mail credentials fall through to the log sink; the cycle aborts on them anyway.
    let alerts: Box<dyn AlertSink> = match (
        &credentials.email_address,
        &credentials.email_password,
        config.dry_run,
    ) {
        (Some(address), Some(password), false) => {
            let email = EmailConfig::from_env(address.clone())?;
            Box::new(EmailAlertSink::new(&email, password)?)
        }
        _ => Box::new(LogAlertSink),
    };

    Bot::new(config, credentials, Box::new(prices), Box::new(news), alerts)
}
