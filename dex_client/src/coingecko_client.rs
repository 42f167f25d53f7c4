use crate::http::{with_path, with_query, HttpFetcher};
use crate::types::{number_at, string_at};
use crate::{DexClientError, Result};
use config_manager::CoinGeckoConfig;
use lookup_core::CoinSnapshot;
use retry_utils::{retry_with_backoff, RetryConfig, RetryableError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Tickers that collide with many listings; pinned to the coin people mean
const PRIORITY_IDS: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("sol", "solana"),
    ("dot", "polkadot"),
    ("avax", "avalanche-2"),
    ("link", "chainlink"),
    ("inj", "injective-protocol"),
    ("sui", "sui"),
    ("ada", "cardano"),
    ("xrp", "ripple"),
    ("doge", "dogecoin"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinListEntry {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    http: Arc<dyn HttpFetcher>,
    retry: RetryConfig,
    coin_list: OnceCell<Vec<CoinListEntry>>,
}

fn classify(error: &DexClientError) -> RetryableError {
    if error.is_rate_limited() {
        RetryableError::RateLimit
    } else {
        RetryableError::Other
    }
}

/// Normalize user ticker input ("/ETH", "$eth ") to lower case
pub fn normalize_ticker(input: &str) -> String {
    input.trim().trim_start_matches(['/', '$']).trim().to_lowercase()
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig, http: Arc<dyn HttpFetcher>) -> Self {
        let retry = RetryConfig::rate_limit_only(config.rate_limit_delays_ms.clone());
        Self {
            config,
            http,
            retry,
            coin_list: OnceCell::new(),
        }
    }

    async fn get_with_retry(&self, url: &str) -> Result<Value> {
        retry_with_backoff(
            || async move {
                let response = self.http.get(url, &[]).await?.error_for_status()?;
                response.json::<Value>()
            },
            &self.retry,
            classify,
        )
        .await
    }

    /// Full `/coins/list`, fetched once per process
    pub async fn coin_list(&self) -> Result<&[CoinListEntry]> {
        let list = self
            .coin_list
            .get_or_try_init(|| async move {
                let url = format!("{}/coins/list", self.config.api_base_url);
                debug!("📋 Fetching CoinGecko coin list");
                let body = self.get_with_retry(&url).await?;
                let list: Vec<CoinListEntry> = serde_json::from_value(body)?;
                info!("✅ Loaded {} coins from CoinGecko", list.len());
                Ok::<_, DexClientError>(list)
            })
            .await?;
        Ok(list.as_slice())
    }

    /// Map a ticker to a CoinGecko id: pinned tickers first, then the coin
    /// list by id, symbol or name.
    pub async fn resolve_id(&self, ticker: &str) -> Result<Option<String>> {
        let wanted = normalize_ticker(ticker);
        if wanted.is_empty() {
            return Ok(None);
        }

        if let Some((_, id)) = PRIORITY_IDS.iter().find(|(symbol, _)| *symbol == wanted) {
            return Ok(Some(id.to_string()));
        }

        let list = self.coin_list().await?;
        let found = list
            .iter()
            .find(|c| c.id == wanted)
            .or_else(|| list.iter().find(|c| c.symbol.eq_ignore_ascii_case(&wanted)))
            .or_else(|| list.iter().find(|c| c.name.eq_ignore_ascii_case(&wanted)));

        Ok(found.map(|c| c.id.clone()))
    }

    /// Market data for one coin id; `Ok(None)` when CoinGecko does not know it
    pub async fn get_coin(&self, id: &str) -> Result<Option<CoinSnapshot>> {
        let url = with_query(
            &with_path(&self.config.api_base_url, &["coins", id])?,
            &[
                ("localization", "false"),
                ("tickers", "false"),
                ("market_data", "true"),
                ("community_data", "false"),
                ("developer_data", "false"),
            ],
        )?;

        let body = match self.get_with_retry(&url).await {
            Ok(body) => body,
            Err(DexClientError::ApiError { status: 404, .. }) => return Ok(None),
            Err(e) => {
                warn!("❌ CoinGecko request for {} failed: {}", id, e);
                return Err(e);
            }
        };

        if let Some(message) = body.get("error").and_then(|e| e.as_str()) {
            return Err(DexClientError::ApiError {
                status: 200,
                message: message.to_string(),
            });
        }

        let Some(market) = body.get("market_data") else {
            return Ok(None);
        };

        let snapshot = CoinSnapshot {
            id: string_at(&body, &["id"]).unwrap_or_else(|| id.to_string()),
            symbol: string_at(&body, &["symbol"]).unwrap_or_default(),
            name: string_at(&body, &["name"]).unwrap_or_else(|| id.to_string()),
            price_usd: number_at(market, &["current_price.usd"]),
            market_cap_usd: number_at(market, &["market_cap.usd"]),
            volume_24h_usd: number_at(market, &["total_volume.usd"]),
            change_24h_pct: number_at(market, &["price_change_percentage_24h"]),
            change_7d_pct: number_at(market, &["price_change_percentage_7d"]),
        };

        info!("✅ CoinGecko snapshot for {}: {:?}", snapshot.id, snapshot.price_usd);
        Ok(Some(snapshot))
    }
}
