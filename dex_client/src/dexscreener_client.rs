use crate::http::{with_path, with_query, HttpFetcher};
use crate::types::{DexPair, PairsResponse, TokenInfo};
use crate::{DexClientError, Result};
use chrono::{TimeZone, Utc};
use config_manager::DexScreenerConfig;
use lookup_core::{parse_number, Chain, LpStatus, QuoteSource, SocialLinks, TokenQuote, UNKNOWN};
use std::sync::Arc;
use tracing::{debug, info};

pub struct DexScreenerClient {
    config: DexScreenerConfig,
    http: Arc<dyn HttpFetcher>,
}

impl DexScreenerClient {
    pub fn new(config: DexScreenerConfig, http: Arc<dyn HttpFetcher>) -> Self {
        Self { config, http }
    }

    /// Manual check link handed to users when nothing is found
    pub fn site_link(&self, chain: Chain, address: &str) -> String {
        format!("{}/{}/{}", self.config.site_url, chain.as_str(), address)
    }

    async fn fetch_pairs(&self, url: &str) -> Result<Vec<DexPair>> {
        let response = self.http.get(url, &[]).await?.error_for_status()?;
        let parsed: PairsResponse = response.json()?;
        Ok(parsed.into_pairs())
    }

    /// `/pairs/{chain}/{address}`: exact pair (or token) on one chain
    pub async fn get_pair(&self, chain: Chain, address: &str) -> Result<Option<DexPair>> {
        let url = with_path(&self.config.api_base_url, &["pairs", chain.as_str(), address])?;
        debug!("🔍 DexScreener pair lookup: {}:{}", chain, address);

        let pairs = self.fetch_pairs(&url).await?;
        Ok(pairs.into_iter().next())
    }

    /// `/tokens/{address}`: every pair trading the token, across chains
    pub async fn get_token_pairs(&self, address: &str) -> Result<Vec<DexPair>> {
        let url = with_path(&self.config.api_base_url, &["tokens", address])?;
        debug!("🔍 DexScreener token pairs: {}", address);

        let pairs = self.fetch_pairs(&url).await?;
        debug!("Retrieved {} pairs for token {}", pairs.len(), address);
        Ok(pairs)
    }

    /// `/search?q=`: free-text search, results span all chains
    pub async fn search_pairs(&self, query: &str) -> Result<Vec<DexPair>> {
        let url = with_query(&format!("{}/search", self.config.api_base_url), &[("q", query)])?;
        debug!("🔍 DexScreener search: {}", query);

        let pairs = self.fetch_pairs(&url).await?;
        debug!("Search returned {} pairs for {}", pairs.len(), query);
        Ok(pairs)
    }

    pub fn to_quote(&self, pair: &DexPair, chain: Chain, address: &str) -> Result<TokenQuote> {
        pair_to_quote(pair, chain, address, &self.site_link(chain, address))
    }
}

fn liquidity_of(pair: &DexPair) -> f64 {
    pair.liquidity
        .as_ref()
        .and_then(|l| l.usd.as_ref())
        .and_then(parse_number)
        .unwrap_or(0.0)
}

/// Highest-liquidity pair whose `chainId` matches; pairs on other chains
/// are ignored even when they are deeper.
pub fn best_pair_on_chain(pairs: &[DexPair], chain: Chain) -> Option<&DexPair> {
    pairs
        .iter()
        .filter(|p| p.chain_id.as_deref().map(|c| c.eq_ignore_ascii_case(chain.as_str())).unwrap_or(false))
        .max_by(|a, b| liquidity_of(a).total_cmp(&liquidity_of(b)))
}

/// Chain of the deepest pair among `allowed`. Used to place an address
/// whose shape fits several chains.
pub fn deepest_chain(pairs: &[DexPair], allowed: &[Chain]) -> Option<Chain> {
    pairs
        .iter()
        .filter_map(|p| {
            let chain = Chain::ALL
                .into_iter()
                .find(|c| p.chain_id.as_deref().map(|id| id.eq_ignore_ascii_case(c.as_str())).unwrap_or(false))?;
            allowed.contains(&chain).then_some((chain, liquidity_of(p)))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(chain, _)| chain)
}

fn pick_social(info: &TokenInfo, matches: impl Fn(&str, &str) -> bool) -> Option<String> {
    info.socials.iter().flatten().find_map(|s| {
        let kind = s.social_type.as_deref().unwrap_or("").to_lowercase();
        let url = s.url.as_deref().unwrap_or("");
        if !url.is_empty() && matches(&kind, url) {
            Some(url.to_string())
        } else {
            None
        }
    })
}

pub fn extract_links(info: Option<&TokenInfo>) -> SocialLinks {
    let Some(info) = info else {
        return SocialLinks::default();
    };

    let website = info
        .websites
        .iter()
        .flatten()
        .find_map(|w| w.url.clone().filter(|u| !u.is_empty()));

    SocialLinks {
        website,
        x: pick_social(info, |kind, url| {
            kind.contains("twitter") || kind == "x" || url.contains("x.com") || url.contains("twitter.com")
        }),
        telegram: pick_social(info, |kind, url| kind.contains("telegram") || url.contains("t.me")),
    }
}

pub fn pair_to_quote(pair: &DexPair, chain: Chain, address: &str, fallback_url: &str) -> Result<TokenQuote> {
    let base = pair.base_token.clone().unwrap_or_default();
    if base.address.is_none() && pair.price_usd.is_none() {
        return Err(DexClientError::NoDataAvailable);
    }

    let source_url = pair.url.clone().filter(|u| !u.is_empty()).unwrap_or_else(|| fallback_url.to_string());
    let mut quote = TokenQuote::new(chain, address, QuoteSource::DexScreener, source_url);

    quote.name = base.name.filter(|n| !n.is_empty()).unwrap_or_else(|| UNKNOWN.to_string());
    quote.symbol = base.symbol.filter(|s| !s.is_empty()).unwrap_or_else(|| UNKNOWN.to_string());
    quote.price_usd = pair.price_usd.as_ref().and_then(parse_number);
    quote.liquidity_usd = pair.liquidity.as_ref().and_then(|l| l.usd.as_ref()).and_then(parse_number);
    quote.volume_24h_usd = pair.volume.as_ref().and_then(|v| v.get("h24")).and_then(parse_number);
    quote.volume_1h_usd = pair.volume.as_ref().and_then(|v| v.get("h1")).and_then(parse_number);
    quote.price_change_24h_pct = pair.price_change.as_ref().and_then(|v| v.get("h24")).and_then(parse_number);
    quote.fdv_usd = pair
        .fdv
        .as_ref()
        .and_then(parse_number)
        .or_else(|| pair.market_cap.as_ref().and_then(parse_number));
    quote.lp_status = LpStatus::from_flag(pair.liquidity.as_ref().and_then(|l| l.locked));
    quote.pair_created_at = pair.pair_created_at.and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    quote.links = extract_links(pair.info.as_ref());

    info!("✅ DexScreener quote for {} on {}: price {:?}", quote.display_name(), chain, quote.price_usd);
    Ok(quote)
}
