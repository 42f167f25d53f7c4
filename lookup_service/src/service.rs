use crate::price_lookup::{PriceLookupClient, Providers};
use crate::risk_annotator::RiskAnnotator;
use crate::ticker::TickerLookup;
use crate::Result;
use config_manager::SystemConfig;
use dex_client::{CoinGeckoClient, HttpFetcher, ReqwestFetcher};
use config_manager::ConfigurationError;
use lookup_core::{
    guess_chain, looks_like_contract, render_outcome, render_ticker_outcome, resolve_chain, resolve_supported_chain,
    Chain, Clock, LookupOutcome, Markup, SystemClock, TickerOutcome, TtlCache,
};
use persistence_layer::{InteractionRecord, InteractionSink, NoopSink, RedisClient};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Front door for contract and ticker lookups. Upstream failures never
/// escape: every call resolves to an outcome value.
pub struct LookupService {
    agent_name: String,
    supported_chains: Vec<Chain>,
    prices: PriceLookupClient,
    tickers: TickerLookup,
    sink: Arc<dyn InteractionSink>,
}

/// Loose address check: non-empty, a single token
fn is_plausible_address(address: &str) -> bool {
    let address = address.trim();
    !address.is_empty() && !address.contains(|c: char| c.is_whitespace() || c == ',' || c == ';')
}

/// Configured chain names resolved through the same aliases users type.
/// Unknown names are skipped with a warning and duplicates collapse.
fn configured_chains(names: &[String]) -> Vec<Chain> {
    let mut chains = Vec::new();
    for name in names {
        match resolve_chain(name) {
            Ok(chain) if !chains.contains(&chain) => chains.push(chain),
            Ok(_) => {}
            Err(e) => warn!("⚠️ Skipping unsupported chain in config: {}", e),
        }
    }
    chains
}

impl LookupService {
    pub fn from_parts(
        config: &SystemConfig,
        http: Arc<dyn HttpFetcher>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn InteractionSink>,
    ) -> Self {
        let supported_chains = configured_chains(&config.system.supported_chains);

        let report_cache = Arc::new(TtlCache::from_config(&config.cache, clock.clone()));
        let coin_cache = Arc::new(TtlCache::from_config(&config.cache, clock));

        let prices = PriceLookupClient::new(
            Providers::from_config(config, http.clone()),
            RiskAnnotator::from_config(config, http.clone()),
            report_cache,
        );
        let tickers = TickerLookup::new(CoinGeckoClient::new(config.coingecko.clone(), http), coin_cache);

        Self {
            agent_name: config.system.agent_name.clone(),
            supported_chains,
            prices,
            tickers,
            sink,
        }
    }

    /// Production wiring: reqwest transport, system clock, and the redis
    /// interaction log when it is enabled and reachable.
    pub async fn from_config(config: &SystemConfig) -> Result<Self> {
        if configured_chains(&config.system.supported_chains).is_empty() {
            return Err(ConfigurationError::InvalidValue(format!(
                "no usable chain in supported_chains {:?}",
                config.system.supported_chains
            ))
            .into());
        }

        let http: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(&config.http)?);

        let sink: Arc<dyn InteractionSink> = if config.interaction_log.enabled {
            let log = &config.interaction_log;
            match RedisClient::new(&log.redis_url, &log.list_key, log.max_entries).await {
                Ok(client) => {
                    match client.interaction_count().await {
                        Ok(count) => info!("📒 Interaction log holds {} records", count),
                        Err(e) => warn!("⚠️ Could not count interaction log records: {}", e),
                    }
                    Arc::new(client)
                }
                Err(e) => {
                    warn!("⚠️ Interaction log unavailable, continuing without it: {}", e);
                    Arc::new(NoopSink)
                }
            }
        } else {
            Arc::new(NoopSink)
        };

        info!("🚀 Lookup service ready for chains: {:?}", config.system.supported_chains);
        Ok(Self::from_parts(config, http, Arc::new(SystemClock), sink))
    }

    pub fn supported_chains(&self) -> &[Chain] {
        &self.supported_chains
    }

    pub fn prices(&self) -> &PriceLookupClient {
        &self.prices
    }

    /// Contract lookup on an explicitly named chain
    pub async fn lookup(&self, chain_input: &str, address: &str) -> LookupOutcome {
        let chain = match resolve_supported_chain(chain_input, &self.supported_chains) {
            Ok(chain) => chain,
            Err(e) => {
                debug!("Rejected chain input: {}", e);
                return LookupOutcome::UnsupportedChain {
                    input: chain_input.trim().to_string(),
                };
            }
        };

        if !is_plausible_address(address) {
            return LookupOutcome::InvalidAddress {
                input: address.trim().to_string(),
            };
        }

        self.prices.lookup(chain, address).await
    }

    /// Contract lookup with the chain guessed from the address shape. A
    /// 0x address could live on any EVM chain, so Dexscreener picks the one
    /// holding its deepest pool before falling back to the shape guess.
    pub async fn scan(&self, address: &str) -> LookupOutcome {
        if !looks_like_contract(address) {
            return LookupOutcome::InvalidAddress {
                input: address.trim().to_string(),
            };
        }

        let guess = guess_chain(address);
        let mut chain = guess;
        if guess.map_or(true, |c| c.is_evm()) {
            let evm: Vec<Chain> = self.supported_chains.iter().copied().filter(Chain::is_evm).collect();
            if let Some(detected) = self.prices.detect_chain(address, &evm).await {
                chain = Some(detected);
            }
        }

        let Some(chain) = chain else {
            return LookupOutcome::InvalidAddress {
                input: address.trim().to_string(),
            };
        };

        if !self.supported_chains.contains(&chain) {
            return LookupOutcome::UnsupportedChain {
                input: chain.as_str().to_string(),
            };
        }

        info!("🔎 Scanning {} on {}", address.trim(), chain);
        self.prices.lookup(chain, address).await
    }

    pub async fn lookup_ticker(&self, ticker: &str) -> TickerOutcome {
        self.tickers.lookup(ticker).await
    }

    /// Rendered reply for `price <chain> <address>`, logged to the sink
    pub async fn answer_price(&self, chain_input: &str, address: &str, markup: Markup) -> String {
        let outcome = self.lookup(chain_input, address).await;
        let response = render_outcome(&outcome, markup);
        self.log_interaction(&format!("price {} {}", chain_input.trim(), address.trim()), &response)
            .await;
        response
    }

    pub async fn answer_scan(&self, address: &str, markup: Markup) -> String {
        let outcome = self.scan(address).await;
        let response = render_outcome(&outcome, markup);
        self.log_interaction(&format!("scan {}", address.trim()), &response).await;
        response
    }

    pub async fn answer_ticker(&self, ticker: &str, markup: Markup) -> String {
        let outcome = self.lookup_ticker(ticker).await;
        let response = render_ticker_outcome(&outcome, markup);
        self.log_interaction(&format!("ticker {}", ticker.trim()), &response).await;
        response
    }

    async fn log_interaction(&self, question: &str, response: &str) {
        let record = InteractionRecord::new(self.agent_name.as_str(), question, response);
        if let Err(e) = self.sink.record(&record).await {
            warn!("⚠️ Failed to log interaction: {}", e);
        }
    }
}
