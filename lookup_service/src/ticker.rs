use dex_client::{normalize_ticker, CoinGeckoClient, DexClientError};
use lookup_core::{CoinSnapshot, TickerOutcome, TtlCache};
use std::sync::Arc;
use tracing::{info, warn};

const PROVIDER: &str = "CoinGecko";

/// Ticker to CoinGecko market snapshot, memoized under `crypto_{ticker}`
pub struct TickerLookup {
    coingecko: CoinGeckoClient,
    cache: Arc<TtlCache<String, Arc<CoinSnapshot>>>,
}

fn failure(error: DexClientError) -> TickerOutcome {
    if error.is_rate_limited() {
        TickerOutcome::RateLimited {
            provider: PROVIDER.to_string(),
        }
    } else {
        TickerOutcome::UpstreamError {
            provider: PROVIDER.to_string(),
            message: error.to_string(),
        }
    }
}

impl TickerLookup {
    pub fn new(coingecko: CoinGeckoClient, cache: Arc<TtlCache<String, Arc<CoinSnapshot>>>) -> Self {
        Self { coingecko, cache }
    }

    pub async fn lookup(&self, ticker: &str) -> TickerOutcome {
        let normalized = normalize_ticker(ticker);
        let not_found = || TickerOutcome::NotFound {
            ticker: ticker.trim().to_string(),
        };
        if normalized.is_empty() {
            return not_found();
        }

        let key = format!("crypto_{}", normalized);
        if let Some(snapshot) = self.cache.get(&key) {
            info!("⚡ Cache hit for {}", key);
            return TickerOutcome::Found(snapshot);
        }

        let id = match self.coingecko.resolve_id(&normalized).await {
            Ok(Some(id)) => id,
            Ok(None) => return not_found(),
            Err(e) => {
                warn!("⚠️ Could not resolve ticker {}: {}", normalized, e);
                return failure(e);
            }
        };

        match self.coingecko.get_coin(&id).await {
            Ok(Some(snapshot)) => {
                let snapshot = Arc::new(snapshot);
                self.cache.insert(key, snapshot.clone());
                TickerOutcome::Found(snapshot)
            }
            Ok(None) => not_found(),
            Err(e) => failure(e),
        }
    }
}
