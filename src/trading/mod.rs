//! Signal pipeline: indicators, news gate, rule evaluation and risk sizing.

mod config;
mod evaluator;
pub mod indicators;
mod news_gate;
mod risk_sizer;

pub use config::{AnalysisConfig, Credentials, RiskConfig, NEWS_TOKEN_VAR};
pub use evaluator::{Evaluation, SignalEvaluator};
pub use news_gate::{NewsGate, CRITICAL_KEYWORDS};
pub use risk_sizer::{RiskPlan, RiskSizer};
