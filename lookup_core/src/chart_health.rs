use crate::quote::{LpStatus, TokenQuote};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthComponent {
    pub name: String,
    pub points: u8,
    pub max_points: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Solid,
    Mid,
    Weak,
}

impl HealthStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            HealthStatus::Solid => "🟢",
            HealthStatus::Mid => "🟡",
            HealthStatus::Weak => "🔴",
        }
    }

    pub fn remark(&self) -> &'static str {
        match self {
            HealthStatus::Solid => "Looks solid. This one has seen a few battles and lived.",
            HealthStatus::Mid => "Mid-grade. Could moon. Could malfunction.",
            HealthStatus::Weak => "Thin market. Proceed with backup.",
        }
    }
}

/// Additive 0-100 market health score over liquidity, volume, FDV, LP and holders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartHealth {
    pub score: u8,
    pub status: HealthStatus,
    pub components: Vec<HealthComponent>,
}

fn component(name: &str, points: u8, max_points: u8) -> HealthComponent {
    HealthComponent {
        name: name.to_string(),
        points,
        max_points,
    }
}

pub fn score_chart_health(quote: &TokenQuote) -> ChartHealth {
    let liquidity = quote.liquidity_usd.unwrap_or(0.0);
    let liquidity_points = if liquidity >= 100_000.0 {
        30
    } else if liquidity >= 50_000.0 {
        20
    } else if liquidity >= 10_000.0 {
        10
    } else {
        0
    };

    let volume = quote.volume_24h_usd.unwrap_or(0.0);
    let volume_points = if volume >= 500_000.0 {
        25
    } else if volume >= 100_000.0 {
        15
    } else if volume >= 10_000.0 {
        5
    } else {
        0
    };

    let fdv = quote.fdv_usd.unwrap_or(0.0);
    let fdv_points = if (100_000.0..=100_000_000.0).contains(&fdv) {
        20
    } else if fdv > 100_000_000.0 {
        10
    } else {
        5
    };

    let lp_points = if quote.lp_status == LpStatus::Locked { 15 } else { 0 };

    let holder_points = match quote.holders {
        Some(h) if h >= 1000 => 10,
        Some(h) if h >= 100 => 5,
        Some(_) => 2,
        None => 0,
    };

    let components = vec![
        component("Liquidity", liquidity_points, 30),
        component("Volume", volume_points, 25),
        component("FDV", fdv_points, 20),
        component("LP Status", lp_points, 15),
        component("Holders", holder_points, 10),
    ];

    let score: u8 = components.iter().map(|c| c.points).sum();
    let status = if score >= 75 {
        HealthStatus::Solid
    } else if score >= 45 {
        HealthStatus::Mid
    } else {
        HealthStatus::Weak
    };

    ChartHealth {
        score,
        status,
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use crate::quote::QuoteSource;

    fn quote() -> TokenQuote {
        TokenQuote::new(Chain::Ethereum, "0xabc", QuoteSource::DexScreener, "")
    }

    #[test]
    fn test_unknown_everything_is_weak() {
        let health = score_chart_health(&quote());
        // FDV below range still earns the floor
        assert_eq!(health.score, 5);
        assert_eq!(health.status, HealthStatus::Weak);
        assert_eq!(health.components.len(), 5);
    }

    #[test]
    fn test_deep_market_is_solid() {
        let mut q = quote();
        q.liquidity_usd = Some(750_000.0);
        q.volume_24h_usd = Some(1_200_000.0);
        q.fdv_usd = Some(25_000_000.0);
        q.lp_status = LpStatus::Locked;
        q.holders = Some(4_200);
        let health = score_chart_health(&q);
        assert_eq!(health.score, 100);
        assert_eq!(health.status, HealthStatus::Solid);
    }

    #[test]
    fn test_mid_market() {
        let mut q = quote();
        q.liquidity_usd = Some(60_000.0);
        q.volume_24h_usd = Some(150_000.0);
        q.fdv_usd = Some(500_000_000.0);
        let health = score_chart_health(&q);
        assert_eq!(health.score, 20 + 15 + 10);
        assert_eq!(health.status, HealthStatus::Mid);
    }
}
