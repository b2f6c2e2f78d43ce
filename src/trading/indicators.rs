//! Technical indicators over an ordered price series (oldest first).
//!
//! Indicators are pure functions of the series and are recomputed each cycle.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{Indicators, Trend};

/// Default RSI lookback.
pub const RSI_PERIOD: usize = 14;

/// Number of most recent samples compared by [`classify_trend`].
pub const TREND_WINDOW: usize = 5;

/// RSI value reported when there is not enough data.
pub const NEUTRAL_RSI: Decimal = dec!(50);

/// Relative Strength Index using a simple average of the last `period` deltas.
///
/// Not Wilder-smoothed: gains and losses are plain arithmetic means over the
/// most recent `period` price changes. Returns 50 when the series is too short
/// or flat, and 100 when there were gains but no losses. Rounded to 2 dp.
pub fn compute_rsi(prices: &[Decimal], period: usize) -> Decimal {
    if period == 0 || prices.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let (gains, losses): (Vec<Decimal>, Vec<Decimal>) = prices
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(Decimal::ZERO), (-change).max(Decimal::ZERO))
        })
        .unzip();

    // Kept separate from the length check above.
    if gains.len() < period {
        return NEUTRAL_RSI;
    }

    let window = Decimal::from(period as u64);
    let avg_gain = gains[gains.len() - period..].iter().copied().sum::<Decimal>() / window;
    let avg_loss = losses[losses.len() - period..].iter().copied().sum::<Decimal>() / window;

    if avg_loss.is_zero() {
        return if avg_gain > Decimal::ZERO {
            dec!(100)
        } else {
            NEUTRAL_RSI
        };
    }

    let rs = avg_gain / avg_loss;
    let rsi = dec!(100) - dec!(100) / (Decimal::ONE + rs);
    rsi.round_dp(2)
}

/// Compare the first and last of the most recent five samples.
///
/// Interior samples are ignored.
pub fn classify_trend(prices: &[Decimal]) -> Trend {
    if prices.len() < TREND_WINDOW {
        return Trend::Neutral;
    }

    let recent = &prices[prices.len() - TREND_WINDOW..];
    let first = recent[0];
    let last = recent[TREND_WINDOW - 1];

    if last > first {
        Trend::Uptrend
    } else if last < first {
        Trend::Downtrend
    } else {
        Trend::Sideways
    }
}

/// RSI and trend for one snapshot.
pub fn compute_indicators(prices: &[Decimal], rsi_period: usize) -> Indicators {
    Indicators {
        rsi: compute_rsi(prices, rsi_period),
        trend: classify_trend(prices),
    }
}
