use crate::chain::Chain;
use crate::chart_health::ChartHealth;
use crate::quote::TokenQuote;
use crate::risk::RiskAnnotation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything produced for one successful contract lookup.
/// This is the value the lookup cache memoizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupReport {
    pub quote: TokenQuote,
    pub risk: RiskAnnotation,
    pub chart_health: ChartHealth,
    pub fetched_at: DateTime<Utc>,
}

/// Result of a contract lookup. Presentation decides the wording.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(Arc<LookupReport>),
    NotFound {
        chain: Chain,
        address: String,
        manual_check_url: String,
    },
    UnsupportedChain {
        input: String,
    },
    InvalidAddress {
        input: String,
    },
    RateLimited {
        provider: String,
    },
    UpstreamError {
        provider: String,
        message: String,
    },
}

impl LookupOutcome {
    pub fn report(&self) -> Option<&Arc<LookupReport>> {
        match self {
            LookupOutcome::Found(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }

    /// Short tag for logs
    pub fn kind(&self) -> &'static str {
        match self {
            LookupOutcome::Found(_) => "found",
            LookupOutcome::NotFound { .. } => "not_found",
            LookupOutcome::UnsupportedChain { .. } => "unsupported_chain",
            LookupOutcome::InvalidAddress { .. } => "invalid_address",
            LookupOutcome::RateLimited { .. } => "rate_limited",
            LookupOutcome::UpstreamError { .. } => "upstream_error",
        }
    }
}

/// 7-day direction of a coin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Upward,
    Downward,
    Stable,
}

impl Trend {
    pub fn from_change(change_pct: Option<f64>) -> Self {
        match change_pct {
            Some(c) if c > 0.0 => Trend::Upward,
            Some(c) if c < 0.0 => Trend::Downward,
            _ => Trend::Stable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Upward => "upward",
            Trend::Downward => "downward",
            Trend::Stable => "stable",
        }
    }
}

/// Market data for a listed coin resolved by ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSnapshot {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub price_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub volume_24h_usd: Option<f64>,
    pub change_24h_pct: Option<f64>,
    pub change_7d_pct: Option<f64>,
}

impl CoinSnapshot {
    pub fn trend_7d(&self) -> Trend {
        Trend::from_change(self.change_7d_pct)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Found(Arc<CoinSnapshot>),
    NotFound { ticker: String },
    RateLimited { provider: String },
    UpstreamError { provider: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_from_change() {
        assert_eq!(Trend::from_change(Some(3.2)), Trend::Upward);
        assert_eq!(Trend::from_change(Some(-0.1)), Trend::Downward);
        assert_eq!(Trend::from_change(Some(0.0)), Trend::Stable);
        assert_eq!(Trend::from_change(None), Trend::Stable);
    }

    #[test]
    fn test_outcome_kind() {
        let outcome = LookupOutcome::UnsupportedChain {
            input: "dogechain".to_string(),
        };
        assert_eq!(outcome.kind(), "unsupported_chain");
        assert!(outcome.report().is_none());
        assert!(!outcome.is_found());
    }
}
