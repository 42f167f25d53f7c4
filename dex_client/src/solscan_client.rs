use crate::http::{with_query, HttpFetcher};
use crate::types::{number_at, string_at};
use crate::Result;
use chrono::{DateTime, TimeZone, Utc};
use config_manager::SolscanConfig;
use lookup_core::{Chain, QuoteSource, TokenQuote, UNKNOWN};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Subset of Solscan `token/meta` the lookup pipeline uses
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolscanTokenMeta {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub price_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub holders: Option<u64>,
    pub supply: Option<f64>,
    pub decimals: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub mint_authority: Option<bool>,
    pub freeze_authority: Option<bool>,
}

/// `Some(true)` when an authority address is set, `Some(false)` when the
/// field is present but null or empty, `None` when Solscan omits it
fn authority_at(data: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| {
        data.get(*key).map(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::Bool(b) => *b,
            _ => true,
        })
    })
}

impl SolscanTokenMeta {
    pub fn from_value(data: &Value) -> Self {
        let created_at = number_at(data, &["createdTime", "createTime", "updateUnixTime"]).and_then(|ts| {
            // Solscan mixes second and millisecond timestamps
            let secs = if ts > 1e12 { ts / 1000.0 } else { ts };
            Utc.timestamp_opt(secs as i64, 0).single()
        });

        Self {
            name: string_at(data, &["tokenName", "name"]),
            symbol: string_at(data, &["tokenSymbol", "symbol"]),
            price_usd: number_at(data, &["priceUsdt", "price"]),
            market_cap_usd: number_at(data, &["marketCap", "marketCapFD"]),
            holders: number_at(data, &["holder"]).map(|h| h as u64),
            supply: number_at(data, &["supply", "tokenSupply"]),
            decimals: number_at(data, &["decimals"]).map(|d| d as u32),
            created_at,
            mint_authority: authority_at(data, &["mintAuthority", "mint_authority"]),
            freeze_authority: authority_at(data, &["freezeAuthority", "freeze_authority"]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.symbol.is_none() && self.price_usd.is_none()
    }

    /// Share of supply held by the largest account. Raw supplies are
    /// scaled by `decimals` when they are clearly not UI amounts.
    pub fn top_holder_pct(&self, top_amount: f64) -> Option<f64> {
        let mut total = self.supply?;
        if let Some(decimals) = self.decimals.filter(|d| *d > 0) {
            if total > 1e6 {
                total /= 10f64.powi(decimals as i32);
            }
        }
        if total <= 0.0 {
            return None;
        }
        Some(((top_amount / total) * 100.0 * 100.0).round() / 100.0)
    }

    pub fn to_quote(&self, address: &str) -> TokenQuote {
        let mut quote = TokenQuote::new(Chain::Solana, address, QuoteSource::Solscan, SolscanClient::token_link(address));
        quote.name = self.name.clone().unwrap_or_else(|| UNKNOWN.to_string());
        quote.symbol = self.symbol.clone().unwrap_or_else(|| UNKNOWN.to_string());
        quote.price_usd = self.price_usd;
        quote.fdv_usd = self.market_cap_usd;
        quote.holders = self.holders;
        quote.pair_created_at = self.created_at;
        quote.mint_authority = self.mint_authority;
        quote.freeze_authority = self.freeze_authority;
        quote.note = Some("🔍 Snatched via Solscan.".to_string());
        quote
    }
}

pub struct SolscanClient {
    config: SolscanConfig,
    http: Arc<dyn HttpFetcher>,
}

impl SolscanClient {
    pub fn new(config: SolscanConfig, http: Arc<dyn HttpFetcher>) -> Self {
        Self { config, http }
    }

    pub fn token_link(address: &str) -> String {
        format!("https://solscan.io/token/{}", address)
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = with_query(&format!("{}{}", self.config.api_base_url, path), params)?;
        let headers: Vec<(&str, &str)> = if self.config.api_key.is_empty() {
            Vec::new()
        } else {
            vec![("token", self.config.api_key.as_str())]
        };
        let response = self.http.get(&url, &headers).await?.error_for_status()?;
        response.json()
    }

    pub async fn get_token_meta(&self, address: &str) -> Result<Option<SolscanTokenMeta>> {
        debug!("🔍 Solscan token meta for {}", address);

        let body = self.get_json("/token/meta", &[("tokenAddress", address)]).await?;
        // Newer API versions wrap the payload in `data`
        let data = body.get("data").filter(|d| d.is_object()).unwrap_or(&body);

        let meta = SolscanTokenMeta::from_value(data);
        if meta.is_empty() {
            return Ok(None);
        }

        info!("✅ Solscan meta for {}: holders {:?}", address, meta.holders);
        Ok(Some(meta))
    }

    /// Balance of the single largest holder, in UI units when Solscan provides them
    pub async fn get_top_holder_amount(&self, address: &str) -> Result<Option<f64>> {
        let body = self
            .get_json("/token/holders", &[("tokenAddress", address), ("offset", "0"), ("limit", "1")])
            .await?;

        let first = ["data", "result", "holders"]
            .iter()
            .find_map(|key| body.get(key).and_then(|v| v.as_array()))
            .and_then(|items| items.first());

        Ok(first.and_then(|item| number_at(item, &["uiAmount", "amount", "balance", "uiAmountString"])))
    }
}
