pub mod cache;
pub mod chain;
pub mod chart_health;
pub mod format;
pub mod outcome;
pub mod quote;
pub mod risk;

// Re-export the types every consumer needs
pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use chain::{guess_chain, looks_like_contract, resolve_chain, resolve_supported_chain, Chain, ChainError};
pub use chart_health::{score_chart_health, ChartHealth, HealthStatus};
pub use format::{render_coin, render_outcome, render_report, render_ticker_outcome, Markup};
pub use outcome::{CoinSnapshot, LookupOutcome, LookupReport, TickerOutcome, Trend};
pub use quote::{parse_number, LpStatus, QuoteSource, SocialLinks, TokenQuote, UNKNOWN};
pub use risk::{
    score_security, wallet_concentration_penalty, RiskAnnotation, RiskAssessment, RiskLabel,
    RuleSet, SecurityFlags, GOPLUS_V1,
};

/// Cache key shared by every contract lookup path
pub fn cache_key(chain: Chain, address: &str) -> String {
    format!("{}_{}", chain.as_str(), address.trim().to_lowercase())
}
