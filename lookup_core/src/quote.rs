use crate::chain::Chain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";

/// Whether the LP tokens backing the pair are locked or burned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LpStatus {
    Locked,
    Unlocked,
    #[default]
    Unknown,
}

impl LpStatus {
    pub fn from_flag(locked: Option<bool>) -> Self {
        match locked {
            Some(true) => LpStatus::Locked,
            Some(false) => LpStatus::Unlocked,
            None => LpStatus::Unknown,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            LpStatus::Locked => "🔥",
            LpStatus::Unlocked => "💦",
            LpStatus::Unknown => "💀",
        }
    }
}

/// Which upstream produced the quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteSource {
    DexScreener,
    Chainlink,
    Etherscan,
    Basescan,
    Solscan,
    BirdEye,
}

impl QuoteSource {
    pub fn name(&self) -> &'static str {
        match self {
            QuoteSource::DexScreener => "Dexscreener",
            QuoteSource::Chainlink => "Chainlink",
            QuoteSource::Etherscan => "Etherscan",
            QuoteSource::Basescan => "Basescan",
            QuoteSource::Solscan => "Solscan",
            QuoteSource::BirdEye => "Birdeye",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub website: Option<String>,
    pub x: Option<String>,
    pub telegram: Option<String>,
}

impl SocialLinks {
    pub fn is_empty(&self) -> bool {
        self.website.is_none() && self.x.is_none() && self.telegram.is_none()
    }
}

/// Market snapshot for one token on one chain.
///
/// Numeric fields are `None` when the upstream did not report them, so a
/// real zero and a missing value stay distinguishable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenQuote {
    pub chain: Chain,
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub price_usd: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub volume_24h_usd: Option<f64>,
    pub volume_1h_usd: Option<f64>,
    pub fdv_usd: Option<f64>,
    pub price_change_24h_pct: Option<f64>,
    pub lp_status: LpStatus,
    pub holders: Option<u64>,
    pub top_holder_pct: Option<f64>,
    /// Solana mint authority still set (`None` when not reported)
    pub mint_authority: Option<bool>,
    pub freeze_authority: Option<bool>,
    pub pair_created_at: Option<DateTime<Utc>>,
    pub links: SocialLinks,
    pub source: QuoteSource,
    pub source_url: String,
    /// Provider-specific flavor line
    pub note: Option<String>,
}

impl TokenQuote {
    /// Empty quote with every market field unknown
    pub fn new(chain: Chain, address: impl Into<String>, source: QuoteSource, source_url: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
            name: UNKNOWN.to_string(),
            symbol: UNKNOWN.to_string(),
            price_usd: None,
            liquidity_usd: None,
            volume_24h_usd: None,
            volume_1h_usd: None,
            fdv_usd: None,
            price_change_24h_pct: None,
            lp_status: LpStatus::Unknown,
            holders: None,
            top_holder_pct: None,
            mint_authority: None,
            freeze_authority: None,
            pair_created_at: None,
            links: SocialLinks::default(),
            source,
            source_url: source_url.into(),
            note: None,
        }
    }

    /// "Name (SYMBOL)", collapsing unknown or duplicated parts
    pub fn display_name(&self) -> String {
        let name_known = !self.name.is_empty() && self.name != UNKNOWN;
        let symbol_known = !self.symbol.is_empty() && self.symbol != UNKNOWN;
        match (name_known, symbol_known) {
            (true, true) if !self.name.eq_ignore_ascii_case(&self.symbol) => {
                format!("{} ({})", self.name, self.symbol)
            }
            (true, _) => self.name.clone(),
            (false, true) => self.symbol.clone(),
            (false, false) => UNKNOWN.to_string(),
        }
    }

    /// Copy fields this quote lacks from another quote of the same token.
    /// Source, link and note stay with `self`.
    pub fn fill_missing(&mut self, other: &TokenQuote) {
        if self.name == UNKNOWN {
            self.name = other.name.clone();
        }
        if self.symbol == UNKNOWN {
            self.symbol = other.symbol.clone();
        }
        for (mine, theirs) in [
            (&mut self.price_usd, other.price_usd),
            (&mut self.liquidity_usd, other.liquidity_usd),
            (&mut self.volume_24h_usd, other.volume_24h_usd),
            (&mut self.volume_1h_usd, other.volume_1h_usd),
            (&mut self.fdv_usd, other.fdv_usd),
            (&mut self.price_change_24h_pct, other.price_change_24h_pct),
            (&mut self.top_holder_pct, other.top_holder_pct),
        ] {
            if mine.is_none() {
                *mine = theirs;
            }
        }
        if self.lp_status == LpStatus::Unknown {
            self.lp_status = other.lp_status;
        }
        self.holders = self.holders.or(other.holders);
        self.mint_authority = self.mint_authority.or(other.mint_authority);
        self.freeze_authority = self.freeze_authority.or(other.freeze_authority);
        self.pair_created_at = self.pair_created_at.or(other.pair_created_at);
        self.links.website = self.links.website.take().or_else(|| other.links.website.clone());
        self.links.x = self.links.x.take().or_else(|| other.links.x.clone());
        self.links.telegram = self.links.telegram.take().or_else(|| other.links.telegram.clone());
    }

    /// Pair age as a coarse "1y 2mo" style string
    pub fn age(&self, now: DateTime<Utc>) -> Option<String> {
        let created = self.pair_created_at?;
        Some(format_age((now - created).num_seconds().max(0) as u64))
    }
}

/// Lenient number parsing for upstream values that arrive as strings
/// ("1,234.5", "$12") or numbers. Non-finite or unparsable values are `None`.
pub fn parse_number(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != '$' && *c != ',')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Seconds to "Ny Nmo Nw", falling back to days for young pairs
pub fn format_age(seconds: u64) -> String {
    const DAY: u64 = 86_400;
    let years = seconds / (365 * DAY);
    let rem = seconds % (365 * DAY);
    let months = rem / (30 * DAY);
    let rem = rem % (30 * DAY);
    let weeks = rem / (7 * DAY);
    let days = (rem % (7 * DAY)) / DAY;

    let mut parts = Vec::new();
    if years > 0 {
        parts.push(format!("{}y", years));
    }
    if months > 0 {
        parts.push(format!("{}mo", months));
    }
    if weeks > 0 {
        parts.push(format!("{}w", weeks));
    }
    if days > 0 && parts.is_empty() {
        parts.push(format!("{}d", days));
    }
    if parts.is_empty() {
        "0d".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_quote_defaults_to_unknown() {
        let quote = TokenQuote::new(Chain::Base, "0xabc", QuoteSource::Basescan, "https://basescan.org/token/0xabc");
        assert_eq!(quote.name, UNKNOWN);
        assert_eq!(quote.price_usd, None);
        assert_eq!(quote.lp_status, LpStatus::Unknown);
        assert_eq!(quote.display_name(), UNKNOWN);
    }

    #[test]
    fn test_display_name() {
        let mut quote = TokenQuote::new(Chain::Ethereum, "0xabc", QuoteSource::DexScreener, "");
        quote.name = "Pepe".to_string();
        quote.symbol = "PEPE".to_string();
        assert_eq!(quote.display_name(), "Pepe");
        quote.name = "Wrapped Ether".to_string();
        quote.symbol = "WETH".to_string();
        assert_eq!(quote.display_name(), "Wrapped Ether (WETH)");
        quote.name = UNKNOWN.to_string();
        assert_eq!(quote.display_name(), "WETH");
    }

    #[test]
    fn test_fill_missing_keeps_own_values() {
        let mut priced = TokenQuote::new(Chain::Solana, "mint", QuoteSource::BirdEye, "https://birdeye.so/token/mint");
        priced.price_usd = Some(0.5);
        priced.symbol = "CAT".to_string();

        let mut meta = TokenQuote::new(Chain::Solana, "mint", QuoteSource::Solscan, "https://solscan.io/token/mint");
        meta.name = "Cat Coin".to_string();
        meta.symbol = "MEOW".to_string();
        meta.price_usd = Some(9.0);
        meta.holders = Some(1200);
        meta.mint_authority = Some(false);

        priced.fill_missing(&meta);
        assert_eq!(priced.price_usd, Some(0.5));
        assert_eq!(priced.symbol, "CAT");
        assert_eq!(priced.name, "Cat Coin");
        assert_eq!(priced.holders, Some(1200));
        assert_eq!(priced.mint_authority, Some(false));
        assert_eq!(priced.source, QuoteSource::BirdEye);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(&json!("1.234567")), Some(1.234567));
        assert_eq!(parse_number(&json!("$1,234.50")), Some(1234.5));
        assert_eq!(parse_number(&json!(42)), Some(42.0));
        assert_eq!(parse_number(&json!("n/a")), None);
        assert_eq!(parse_number(&json!(null)), None);
    }

    #[test]
    fn test_lp_icons() {
        assert_eq!(LpStatus::from_flag(Some(true)).icon(), "🔥");
        assert_eq!(LpStatus::from_flag(Some(false)).icon(), "💦");
        assert_eq!(LpStatus::from_flag(None).icon(), "💀");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(0), "0d");
        assert_eq!(format_age(3 * 86_400), "3d");
        assert_eq!(format_age(400 * 86_400), "1y 1mo");
        assert_eq!(format_age(9 * 86_400), "1w");
    }
}
