use crate::risk_annotator::RiskAnnotator;
use chrono::Utc;
use config_manager::SystemConfig;
use dex_client::{
    best_pair_on_chain, deepest_chain, BirdEyeClient, ChainlinkClient, DexClientError, DexPair, DexScreenerClient,
    ExplorerClient, HttpFetcher, SolscanClient,
};
use lookup_core::{
    cache_key, score_chart_health, Chain, LookupOutcome, LookupReport, QuoteSource, TokenQuote, TtlCache,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Every upstream a contract lookup may consult, sharing one HTTP seam
pub struct Providers {
    pub dexscreener: DexScreenerClient,
    pub chainlink: ChainlinkClient,
    pub etherscan: ExplorerClient,
    pub basescan: ExplorerClient,
    pub solscan: SolscanClient,
    pub birdeye: BirdEyeClient,
}

impl Providers {
    pub fn from_config(config: &SystemConfig, http: Arc<dyn HttpFetcher>) -> Self {
        Self {
            dexscreener: DexScreenerClient::new(config.dexscreener.clone(), http.clone()),
            chainlink: ChainlinkClient::new(config.chainlink.clone(), http.clone()),
            etherscan: ExplorerClient::etherscan(config.etherscan.clone(), http.clone()),
            basescan: ExplorerClient::basescan(config.basescan.clone(), http.clone()),
            solscan: SolscanClient::new(config.solscan.clone(), http.clone()),
            birdeye: BirdEyeClient::new(config.birdeye.clone(), http),
        }
    }
}

/// Walks fallback steps until one yields a priced quote. Quotes without a
/// price are held back and used to fill gaps in a later priced quote, or
/// returned as-is when nothing better turns up.
#[derive(Debug, Default)]
struct Fallbacks {
    held: Option<TokenQuote>,
}

impl Fallbacks {
    fn offer(&mut self, quote: Option<TokenQuote>) -> Option<TokenQuote> {
        let mut quote = quote?;
        if quote.price_usd.is_none() {
            debug!("{} answered without a price, trying the next source", quote.source.name());
            if let Some(held) = self.held.as_mut() {
                held.fill_missing(&quote);
            } else {
                self.held = Some(quote);
            }
            return None;
        }
        if let Some(held) = &self.held {
            quote.fill_missing(held);
        }
        Some(quote)
    }

    fn finish(self) -> Option<TokenQuote> {
        self.held
    }
}

/// What the fallback steps reported when none of them produced a quote
#[derive(Debug, Default)]
struct Attempts {
    answered: bool,
    rate_limited_by: Option<String>,
    last_error: Option<(String, String)>,
}

impl Attempts {
    /// Fold one step's result into the tally; returns the value on success
    fn record<T>(&mut self, provider: &str, result: dex_client::Result<Option<T>>) -> Option<T> {
        match result {
            Ok(Some(value)) => Some(value),
            Ok(None) | Err(DexClientError::ApiError { status: 404, .. }) => {
                debug!("{} has no data", provider);
                self.answered = true;
                None
            }
            Err(e) if e.is_rate_limited() => {
                warn!("⏳ {} rate limited, moving on", provider);
                self.rate_limited_by.get_or_insert_with(|| provider.to_string());
                None
            }
            Err(e) => {
                warn!("⚠️ {} failed, moving on: {}", provider, e);
                self.last_error = Some((provider.to_string(), e.to_string()));
                None
            }
        }
    }

    fn into_outcome(self, chain: Chain, address: &str, manual_check_url: String) -> LookupOutcome {
        if self.answered {
            return LookupOutcome::NotFound {
                chain,
                address: address.to_string(),
                manual_check_url,
            };
        }
        if let Some(provider) = self.rate_limited_by {
            return LookupOutcome::RateLimited { provider };
        }
        match self.last_error {
            Some((provider, message)) => LookupOutcome::UpstreamError { provider, message },
            None => LookupOutcome::NotFound {
                chain,
                address: address.to_string(),
                manual_check_url,
            },
        }
    }
}

pub struct PriceLookupClient {
    providers: Providers,
    annotator: RiskAnnotator,
    cache: Arc<TtlCache<String, Arc<LookupReport>>>,
}

impl PriceLookupClient {
    pub fn new(
        providers: Providers,
        annotator: RiskAnnotator,
        cache: Arc<TtlCache<String, Arc<LookupReport>>>,
    ) -> Self {
        Self {
            providers,
            annotator,
            cache,
        }
    }

    pub fn cache(&self) -> &TtlCache<String, Arc<LookupReport>> {
        &self.cache
    }

    /// Cached report or a fresh walk of the fallback chain. Only `Found`
    /// outcomes are memoized.
    pub async fn lookup(&self, chain: Chain, address: &str) -> LookupOutcome {
        let address = address.trim();
        let key = cache_key(chain, address);

        if let Some(report) = self.cache.get(&key) {
            info!("⚡ Cache hit for {}", key);
            return LookupOutcome::Found(report);
        }

        let mut attempts = Attempts::default();
        let Some(mut quote) = self.fetch_quote(chain, address, &mut attempts).await else {
            let outcome = attempts.into_outcome(chain, address, self.providers.dexscreener.site_link(chain, address));
            info!("🔎 No quote for {} on {}: {}", address, chain, outcome.kind());
            return outcome;
        };

        if chain == Chain::Solana && quote.source == QuoteSource::DexScreener {
            self.enrich_solana(&mut quote).await;
        }

        let risk = self.annotator.annotate(chain, address).await;
        let chart_health = score_chart_health(&quote);
        let report = Arc::new(LookupReport {
            quote,
            risk,
            chart_health,
            fetched_at: Utc::now(),
        });

        self.cache.insert(key, report.clone());
        LookupOutcome::Found(report)
    }

    fn quote_from_pair(&self, pair: Option<DexPair>, chain: Chain, address: &str) -> Option<TokenQuote> {
        let pair = pair?;
        match self.providers.dexscreener.to_quote(&pair, chain, address) {
            Ok(quote) => Some(quote),
            Err(e) => {
                debug!("Skipping unusable Dexscreener pair: {}", e);
                None
            }
        }
    }

    /// Dexscreener first (pair, token, search), then the chain's own fallbacks
    async fn fetch_quote(&self, chain: Chain, address: &str, attempts: &mut Attempts) -> Option<TokenQuote> {
        let dex = &self.providers.dexscreener;
        let provider = QuoteSource::DexScreener.name();

        let pair = attempts.record(provider, dex.get_pair(chain, address).await);
        if let Some(quote) = self.quote_from_pair(pair, chain, address) {
            return Some(quote);
        }

        let token_pairs = dex
            .get_token_pairs(address)
            .await
            .map(|pairs| best_pair_on_chain(&pairs, chain).cloned());
        if let Some(quote) = self.quote_from_pair(attempts.record(provider, token_pairs), chain, address) {
            return Some(quote);
        }

        let searched = dex
            .search_pairs(address)
            .await
            .map(|pairs| best_pair_on_chain(&pairs, chain).cloned());
        if let Some(quote) = self.quote_from_pair(attempts.record(provider, searched), chain, address) {
            return Some(quote);
        }

        debug!("Dexscreener has nothing for {} on {}, trying chain fallbacks", address, chain);

        let mut fallbacks = Fallbacks::default();
        match chain {
            Chain::Ethereum => {
                let chainlink = &self.providers.chainlink;
                if chainlink.is_configured() {
                    let feed = attempts.record(QuoteSource::Chainlink.name(), chainlink.get_quote(address).await);
                    if let Some(quote) = fallbacks.offer(feed) {
                        return Some(quote);
                    }
                }
                self.explorer_fallback(&self.providers.etherscan, address, attempts, &mut fallbacks)
                    .await
            }
            Chain::Base => {
                self.explorer_fallback(&self.providers.basescan, address, attempts, &mut fallbacks)
                    .await
            }
            Chain::Solana => {
                let meta = attempts.record(QuoteSource::Solscan.name(), self.providers.solscan.get_token_meta(address).await);
                if let Some(quote) = fallbacks.offer(meta.map(|m| m.to_quote(address))) {
                    return Some(quote);
                }
                let birdeye = attempts.record(QuoteSource::BirdEye.name(), self.providers.birdeye.get_token(chain, address).await);
                fallbacks.offer(birdeye).or_else(|| fallbacks.finish())
            }
            Chain::Sui => attempts.record(QuoteSource::BirdEye.name(), self.providers.birdeye.get_token(chain, address).await),
            Chain::Abstract => None,
        }
    }

    async fn explorer_fallback(
        &self,
        explorer: &ExplorerClient,
        address: &str,
        attempts: &mut Attempts,
        fallbacks: &mut Fallbacks,
    ) -> Option<TokenQuote> {
        let verified = attempts.record(explorer.name(), explorer.get_verified_contract(address).await);
        if let Some(quote) = fallbacks.offer(verified) {
            return Some(quote);
        }
        let info = attempts.record(explorer.name(), explorer.get_token_info(address).await);
        fallbacks.offer(info).or_else(|| std::mem::take(fallbacks).finish())
    }

    /// Chain with the deepest Dexscreener pool for an address whose shape
    /// fits several chains. `None` when Dexscreener cannot place it.
    pub async fn detect_chain(&self, address: &str, candidates: &[Chain]) -> Option<Chain> {
        if candidates.is_empty() {
            return None;
        }
        match self.providers.dexscreener.get_token_pairs(address.trim()).await {
            Ok(pairs) => deepest_chain(&pairs, candidates),
            Err(e) => {
                debug!("Chain detection skipped for {}: {}", address, e);
                None
            }
        }
    }

    /// Holders, top-holder share and mint/freeze authorities from Solscan;
    /// failures are ignored
    async fn enrich_solana(&self, quote: &mut TokenQuote) {
        let solscan = &self.providers.solscan;

        let meta = match solscan.get_token_meta(&quote.address).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return,
            Err(e) => {
                debug!("Solscan enrichment skipped for {}: {}", quote.address, e);
                return;
            }
        };

        if quote.holders.is_none() {
            quote.holders = meta.holders;
        }
        quote.mint_authority = quote.mint_authority.or(meta.mint_authority);
        quote.freeze_authority = quote.freeze_authority.or(meta.freeze_authority);

        match solscan.get_top_holder_amount(&quote.address).await {
            Ok(Some(top)) => quote.top_holder_pct = meta.top_holder_pct(top),
            Ok(None) => {}
            Err(e) => debug!("Solscan top holder skipped for {}: {}", quote.address, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found(outcome: &LookupOutcome) -> bool {
        matches!(outcome, LookupOutcome::NotFound { .. })
    }

    fn quote(source: QuoteSource, price: Option<f64>) -> TokenQuote {
        let mut quote = TokenQuote::new(Chain::Solana, "mint", source, "");
        quote.price_usd = price;
        quote
    }

    #[test]
    fn test_fallbacks_hold_unpriced_quotes() {
        let mut fallbacks = Fallbacks::default();
        let mut meta = quote(QuoteSource::Solscan, None);
        meta.holders = Some(42);
        assert!(fallbacks.offer(Some(meta)).is_none());
        assert!(fallbacks.offer(None).is_none());

        let priced = fallbacks.offer(Some(quote(QuoteSource::BirdEye, Some(0.3)))).unwrap();
        assert_eq!(priced.source, QuoteSource::BirdEye);
        assert_eq!(priced.holders, Some(42));
    }

    #[test]
    fn test_fallbacks_return_held_quote_when_nothing_is_priced() {
        let mut fallbacks = Fallbacks::default();
        assert!(fallbacks.offer(Some(quote(QuoteSource::Etherscan, None))).is_none());
        assert!(fallbacks.offer(Some(quote(QuoteSource::Etherscan, None))).is_none());
        assert_eq!(fallbacks.finish().map(|q| q.source), Some(QuoteSource::Etherscan));
        assert!(Fallbacks::default().finish().is_none());
    }

    #[test]
    fn test_clean_answer_beats_errors() {
        let mut attempts = Attempts::default();
        attempts.record::<()>("A", Err(DexClientError::RateLimitExceeded));
        attempts.record::<()>("B", Ok(None));
        assert!(not_found(&attempts.into_outcome(Chain::Base, "0xabc", String::new())));
    }

    #[test]
    fn test_rate_limit_reports_first_provider() {
        let mut attempts = Attempts::default();
        attempts.record::<()>("A", Err(DexClientError::Transport("timeout".to_string())));
        attempts.record::<()>("B", Err(DexClientError::RateLimitExceeded));
        attempts.record::<()>("C", Err(DexClientError::RateLimitExceeded));
        assert_eq!(
            attempts.into_outcome(Chain::Base, "0xabc", String::new()),
            LookupOutcome::RateLimited { provider: "B".to_string() }
        );
    }

    #[test]
    fn test_errors_only_is_upstream_error() {
        let mut attempts = Attempts::default();
        attempts.record::<()>("A", Err(DexClientError::ApiError { status: 502, message: "bad gateway".to_string() }));
        match attempts.into_outcome(Chain::Sui, "0x2", String::new()) {
            LookupOutcome::UpstreamError { provider, message } => {
                assert_eq!(provider, "A");
                assert!(message.contains("502"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_404_counts_as_answer_and_no_steps_is_not_found() {
        let mut attempts = Attempts::default();
        attempts.record::<()>("A", Err(DexClientError::ApiError { status: 404, message: String::new() }));
        assert!(attempts.answered);
        assert!(not_found(&Attempts::default().into_outcome(Chain::Abstract, "0xabc", String::new())));
    }
}
