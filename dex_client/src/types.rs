use lookup_core::parse_number;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// Every field is optional: Dexscreener omits whatever it does not know, and
// numeric fields arrive as strings or numbers depending on the endpoint.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairsResponse {
    pub pair: Option<DexPair>,
    pub pairs: Option<Vec<DexPair>>,
}

impl PairsResponse {
    pub fn into_pairs(self) -> Vec<DexPair> {
        let mut out = self.pairs.unwrap_or_default();
        if let Some(pair) = self.pair {
            out.insert(0, pair);
        }
        out
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DexPair {
    #[serde(rename = "chainId")]
    pub chain_id: Option<String>,
    #[serde(rename = "dexId")]
    pub dex_id: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "pairAddress")]
    pub pair_address: Option<String>,
    #[serde(rename = "baseToken")]
    pub base_token: Option<DexToken>,
    #[serde(rename = "quoteToken")]
    pub quote_token: Option<DexToken>,
    #[serde(rename = "priceUsd")]
    pub price_usd: Option<Value>,
    pub volume: Option<HashMap<String, Value>>,
    #[serde(rename = "priceChange")]
    pub price_change: Option<HashMap<String, Value>>,
    pub liquidity: Option<Liquidity>,
    pub fdv: Option<Value>,
    #[serde(rename = "marketCap")]
    pub market_cap: Option<Value>,
    #[serde(rename = "pairCreatedAt")]
    pub pair_created_at: Option<i64>,
    pub info: Option<TokenInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DexToken {
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Liquidity {
    pub usd: Option<Value>,
    pub base: Option<Value>,
    pub quote: Option<Value>,
    /// Not part of the public schema; honored when a mirror reports it
    pub locked: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenInfo {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub websites: Option<Vec<Website>>,
    pub socials: Option<Vec<Social>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Website {
    pub label: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Social {
    #[serde(rename = "type")]
    pub social_type: Option<String>,
    pub url: Option<String>,
}

/// First parsable number among dotted paths such as `"liquidity.usd"`
pub(crate) fn number_at(data: &Value, paths: &[&str]) -> Option<f64> {
    paths.iter().find_map(|path| {
        let mut node = data;
        for key in path.split('.') {
            node = node.get(key)?;
        }
        parse_number(node)
    })
}

/// First non-empty string among top-level keys
pub(crate) fn string_at(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        data.get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
