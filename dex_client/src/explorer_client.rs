use crate::http::{with_query, HttpFetcher};
use crate::types::{number_at, string_at};
use crate::{DexClientError, Result};
use config_manager::ExplorerConfig;
use lookup_core::{Chain, QuoteSource, SocialLinks, TokenQuote, UNKNOWN};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Etherscan-family envelope: `result` is an array on success and a
/// message string on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub result: Option<Value>,
}

impl ExplorerResponse {
    /// First result record, `Ok(None)` for "no data", errors for rate limits and bad keys
    fn first_record(self) -> Result<Option<Value>> {
        match self.result {
            Some(Value::Array(items)) => Ok(items.into_iter().next().filter(|v| v.is_object())),
            Some(Value::String(text)) => {
                let lower = text.to_lowercase();
                if lower.contains("rate limit") {
                    Err(DexClientError::RateLimitExceeded)
                } else if lower.contains("no data") || lower.contains("not found") {
                    Ok(None)
                } else {
                    Err(DexClientError::ApiError { status: 200, message: text })
                }
            }
            _ => Ok(None),
        }
    }
}

/// Etherscan-compatible block explorer API (Etherscan, Basescan)
pub struct ExplorerClient {
    chain: Chain,
    source: QuoteSource,
    config: ExplorerConfig,
    http: Arc<dyn HttpFetcher>,
}

impl ExplorerClient {
    pub fn etherscan(config: ExplorerConfig, http: Arc<dyn HttpFetcher>) -> Self {
        Self {
            chain: Chain::Ethereum,
            source: QuoteSource::Etherscan,
            config,
            http,
        }
    }

    pub fn basescan(config: ExplorerConfig, http: Arc<dyn HttpFetcher>) -> Self {
        Self {
            chain: Chain::Base,
            source: QuoteSource::Basescan,
            config,
            http,
        }
    }

    pub fn name(&self) -> &'static str {
        self.source.name()
    }

    pub fn token_link(&self, address: &str) -> String {
        format!("{}/token/{}", self.config.site_url, address)
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Option<Value>> {
        let mut all = params.to_vec();
        if !self.config.api_key.is_empty() {
            all.push(("apikey", self.config.api_key.as_str()));
        }
        let url = with_query(&self.config.api_base_url, &all)?;

        let response = self.http.get(&url, &[]).await?.error_for_status()?;
        let parsed: ExplorerResponse = response.json()?;
        parsed.first_record()
    }

    /// Verified source lookup; `Ok(None)` when the contract is not verified
    pub async fn get_verified_contract(&self, address: &str) -> Result<Option<TokenQuote>> {
        debug!("📜 {} getsourcecode for {}", self.name(), address);

        let record = self
            .query(&[("module", "contract"), ("action", "getsourcecode"), ("address", address)])
            .await?;

        let Some(name) = record.as_ref().and_then(|r| string_at(r, &["ContractName"])) else {
            debug!("{} has no verified source for {}", self.name(), address);
            return Ok(None);
        };

        let mut quote = TokenQuote::new(self.chain, address, self.source, self.token_link(address));
        quote.name = name;
        quote.note = Some(format!("📜 Verified on {}.", self.name()));

        info!("✅ {} verified contract: {}", self.name(), quote.name);
        Ok(Some(quote))
    }

    /// Token metadata (`tokeninfo`), including a USD price when the explorer tracks one
    pub async fn get_token_info(&self, address: &str) -> Result<Option<TokenQuote>> {
        debug!("📦 {} tokeninfo for {}", self.name(), address);

        let record = self
            .query(&[("module", "token"), ("action", "tokeninfo"), ("contractaddress", address)])
            .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let quote = self.token_info_to_quote(&record, address);
        if quote.symbol == UNKNOWN && quote.name == UNKNOWN {
            return Ok(None);
        }

        info!("✅ {} token info: {}", self.name(), quote.display_name());
        Ok(Some(quote))
    }

    fn token_info_to_quote(&self, record: &Value, address: &str) -> TokenQuote {
        let mut quote = TokenQuote::new(self.chain, address, self.source, self.token_link(address));
        quote.name = string_at(record, &["tokenName"]).unwrap_or_else(|| UNKNOWN.to_string());
        quote.symbol = string_at(record, &["symbol"]).unwrap_or_else(|| UNKNOWN.to_string());
        quote.price_usd = number_at(record, &["tokenPriceUSD"]).filter(|p| *p > 0.0);
        quote.fdv_usd = number_at(record, &["fully_diluted_market_cap"]).filter(|v| *v > 0.0);
        quote.links = SocialLinks {
            website: string_at(record, &["website"]),
            x: string_at(record, &["twitter"]),
            telegram: string_at(record, &["telegram"]),
        };
        quote.note = Some(format!("📦 Basic {} token info.", self.name()));
        quote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> ExplorerResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_first_record_shapes() {
        let ok = response(json!({"status": "1", "result": [{"ContractName": "FiatTokenProxy"}]}));
        assert!(ok.first_record().unwrap().is_some());

        let limited = response(json!({"status": "0", "message": "NOTOK", "result": "Max rate limit reached"}));
        assert!(matches!(limited.first_record(), Err(DexClientError::RateLimitExceeded)));

        let bad_key = response(json!({"status": "0", "message": "NOTOK", "result": "Invalid API Key"}));
        assert!(matches!(bad_key.first_record(), Err(DexClientError::ApiError { .. })));

        let empty = response(json!({"status": "0", "message": "No data found", "result": []}));
        assert!(empty.first_record().unwrap().is_none());
    }
}
