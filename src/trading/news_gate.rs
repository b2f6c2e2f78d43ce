//! Headline kill switch.
//!
//! Matching is a case-insensitive substring search, so "second" trips on "sec".

/// Keywords that halt trading when found in any headline.
pub const CRITICAL_KEYWORDS: [&str; 9] = [
    "hack",
    "sec",
    "regulation",
    "crash",
    "ban",
    "lawsuit",
    "investigation",
    "fed",
    "cpi",
];

/// Stateless classifier over a batch of headlines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewsGate;

impl NewsGate {
    /// True if any headline mentions a critical keyword.
    pub fn should_halt<S: AsRef<str>>(headlines: &[S]) -> bool {
        headlines.iter().any(|h| is_critical(h.as_ref()))
    }

    /// Headlines that triggered the gate, in feed order.
    pub fn critical_headlines<S: AsRef<str>>(headlines: &[S]) -> Vec<&str> {
        headlines
            .iter()
            .map(|h| h.as_ref())
            .filter(|h| is_critical(h))
            .collect()
    }
}

fn is_critical(headline: &str) -> bool {
    let lower = headline.to_lowercase();
    CRITICAL_KEYWORDS.iter().any(|k| lower.contains(k))
}
