use crate::http::{with_path, with_query, HttpFetcher};
use crate::types::{number_at, string_at};
use crate::Result;
use config_manager::BirdEyeConfig;
use lookup_core::{Chain, LpStatus, QuoteSource, TokenQuote, UNKNOWN};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Envelope for BirdEye `public/token/{address}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BirdEyeTokenResponse {
    pub success: Option<bool>,
    pub data: Option<Value>,
}

pub struct BirdEyeClient {
    config: BirdEyeConfig,
    http: Arc<dyn HttpFetcher>,
}

impl BirdEyeClient {
    pub fn new(config: BirdEyeConfig, http: Arc<dyn HttpFetcher>) -> Self {
        Self { config, http }
    }

    pub fn token_link(chain: Chain, address: &str) -> String {
        format!("https://birdeye.so/token/{}?chain={}", address, chain.as_str())
    }

    /// Token snapshot for solana or sui. `Ok(None)` when BirdEye has no data.
    pub async fn get_token(&self, chain: Chain, address: &str) -> Result<Option<TokenQuote>> {
        let url = with_query(
            &with_path(&self.config.api_base_url, &["public", "token", address])?,
            &[("chain", chain.as_str()), ("include", "volume,liquidity")],
        )?;

        if self.config.api_key.is_empty() {
            warn!("⚠️ BirdEye API key not configured, request may be rejected");
        }

        debug!("Fetching token {} from BirdEye for chain: {}", address, chain);

        let response = self
            .http
            .get(&url, &[("X-API-KEY", self.config.api_key.as_str()), ("x-chain", chain.as_str())])
            .await?
            .error_for_status()?;

        let parsed: BirdEyeTokenResponse = response.json()?;
        let Some(data) = parsed.data.filter(|d| d.is_object()) else {
            debug!("BirdEye returned no data for {}", address);
            return Ok(None);
        };

        let quote = birdeye_to_quote(&data, chain, address);
        if quote.price_usd.is_none() && quote.symbol == UNKNOWN {
            return Ok(None);
        }

        info!("✅ BirdEye quote for {} on {}", quote.display_name(), chain);
        Ok(Some(quote))
    }
}

pub fn birdeye_to_quote(data: &Value, chain: Chain, address: &str) -> TokenQuote {
    let mut quote = TokenQuote::new(chain, address, QuoteSource::BirdEye, BirdEyeClient::token_link(chain, address));

    quote.symbol = string_at(data, &["symbol"]).unwrap_or_else(|| UNKNOWN.to_string());
    quote.name = string_at(data, &["name"]).unwrap_or_else(|| quote.symbol.clone());
    quote.price_usd = number_at(data, &["value", "price", "priceUsd"]);
    quote.volume_24h_usd = number_at(data, &["volume24hUsd", "v24hUSD", "volume.h24"]);
    quote.liquidity_usd = number_at(data, &["liquidity.usd", "liquidity"]);
    quote.fdv_usd = number_at(data, &["marketCap", "mc", "fdv"]);
    quote.holders = number_at(data, &["holder"]).map(|h| h as u64);
    quote.lp_status = LpStatus::Unknown;
    quote.note = Some(match chain {
        Chain::Sui => "🧪 Sui data via Birdeye.".to_string(),
        _ => "💨 Backup data via Birdeye.".to_string(),
    });
    quote
}
