//! Data models for price samples, indicators and signals.

mod price;
mod signal;

pub use price::PriceSample;
pub use signal::{Indicators, Signal, SignalAction, SignalRule, Trend};
