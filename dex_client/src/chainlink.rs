//! Chainlink Feed Registry reads over plain JSON-RPC `eth_call`.
//!
//! Two calls per price: `getFeed(base, quote)` on the registry resolves the
//! aggregator, then `latestRoundData()` on the aggregator returns the answer
//! scaled by the feed decimals.

use crate::http::HttpFetcher;
use crate::{DexClientError, Result};
use config_manager::ChainlinkConfig;
use lookup_core::{Chain, QuoteSource, TokenQuote};
use serde_json::{json, Value};
use std::sync::Arc;
use tiny_keccak::{Hasher, Keccak};
use tracing::{debug, info};

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    selector
}

/// Decode a 0x-prefixed 20-byte address
fn parse_address(address: &str) -> Result<[u8; 20]> {
    let raw = hex::decode(address.trim().trim_start_matches("0x"))
        .map_err(|e| DexClientError::InvalidResponse(format!("Bad address {}: {}", address, e)))?;
    raw.try_into()
        .map_err(|_| DexClientError::InvalidResponse(format!("Address {} is not 20 bytes", address)))
}

fn abi_encode_address(address: &[u8; 20]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

pub fn encode_get_feed(base: &str, quote: &str) -> Result<Vec<u8>> {
    let mut data = function_selector("getFeed(address,address)").to_vec();
    data.extend_from_slice(&abi_encode_address(&parse_address(base)?));
    data.extend_from_slice(&abi_encode_address(&parse_address(quote)?));
    Ok(data)
}

pub fn encode_latest_round_data() -> Vec<u8> {
    function_selector("latestRoundData()").to_vec()
}

/// `n`th 32-byte word of an ABI return value
fn word(result: &[u8], n: usize) -> Option<&[u8]> {
    result.get(n * 32..(n + 1) * 32)
}

pub fn decode_address(result: &[u8]) -> Option<String> {
    let w = word(result, 0)?;
    if w.iter().all(|b| *b == 0) {
        return None;
    }
    Some(format!("0x{}", hex::encode(&w[12..])))
}

/// `answer` (second word, int256) as a decimal price; negative answers are rejected
pub fn decode_answer(result: &[u8], decimals: u32) -> Option<f64> {
    let w = word(result, 1)?;
    if w[0] & 0x80 != 0 {
        return None;
    }
    if w[..16].iter().any(|b| *b != 0) {
        // Larger than any real price feed
        return None;
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&w[16..]);
    let raw = u128::from_be_bytes(low);
    Some(raw as f64 / 10f64.powi(decimals as i32))
}

pub struct ChainlinkClient {
    config: ChainlinkConfig,
    http: Arc<dyn HttpFetcher>,
}

impl ChainlinkClient {
    pub fn new(config: ChainlinkConfig, http: Arc<dyn HttpFetcher>) -> Self {
        Self { config, http }
    }

    pub fn is_configured(&self) -> bool {
        self.config.rpc_url.as_deref().map(|u| !u.is_empty()).unwrap_or(false)
    }

    /// Raw `eth_call`; `Ok(None)` when the call reverts
    async fn eth_call(&self, to: &str, data: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(rpc_url) = self.config.rpc_url.as_deref() else {
            return Err(DexClientError::InvalidResponse("No RPC URL configured".to_string()));
        };

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{"to": to, "data": format!("0x{}", hex::encode(data))}, "latest"],
        });

        let response = self.http.post_json(rpc_url, &[], &body).await?.error_for_status()?;
        let parsed: Value = response.json()?;

        if let Some(error) = parsed.get("error") {
            let message = error.get("message").and_then(|m| m.as_str()).unwrap_or("unknown RPC error");
            if message.to_lowercase().contains("revert") {
                debug!("eth_call to {} reverted: {}", to, message);
                return Ok(None);
            }
            return Err(DexClientError::ApiError {
                status: 200,
                message: message.to_string(),
            });
        }

        let hex_result = parsed
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| DexClientError::InvalidResponse("eth_call result missing".to_string()))?;

        let bytes = hex::decode(hex_result.trim_start_matches("0x"))
            .map_err(|e| DexClientError::InvalidResponse(format!("eth_call result not hex: {}", e)))?;
        Ok(if bytes.is_empty() { None } else { Some(bytes) })
    }

    /// USD price from the feed registry; `Ok(None)` when no feed exists for the token
    pub async fn get_usd_price(&self, base: &str) -> Result<Option<f64>> {
        let calldata = encode_get_feed(base, &self.config.usd_denomination)?;
        let Some(feed_result) = self.eth_call(&self.config.feed_registry, &calldata).await? else {
            debug!("No Chainlink feed registered for {}", base);
            return Ok(None);
        };

        let Some(aggregator) = decode_address(&feed_result) else {
            return Ok(None);
        };

        let Some(round) = self.eth_call(&aggregator, &encode_latest_round_data()).await? else {
            return Ok(None);
        };

        let price = decode_answer(&round, self.config.decimals);
        if let Some(p) = price {
            info!("🔗 Chainlink price for {}: ${:.6}", base, p);
        }
        Ok(price)
    }

    pub async fn get_quote(&self, address: &str) -> Result<Option<TokenQuote>> {
        let Some(price) = self.get_usd_price(address).await? else {
            return Ok(None);
        };

        let mut quote = TokenQuote::new(Chain::Ethereum, address, QuoteSource::Chainlink, "https://data.chain.link");
        quote.price_usd = Some(price);
        quote.note = Some("🔗 Chainlink verified price.".to_string());
        Ok(Some(quote))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(function_selector("latestRoundData()")), "feaf968c");
        assert_eq!(hex::encode(function_selector("balanceOf(address)")), "70a08231");
    }

    #[test]
    fn test_encode_get_feed_layout() {
        let data = encode_get_feed(
            "0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984",
            "0x0000000000000000000000000000000000000348",
        )
        .unwrap();
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(data[67], 0x48);
        assert!(encode_get_feed("0x1234", "0x0000000000000000000000000000000000000348").is_err());
    }

    #[test]
    fn test_decode_round_data() {
        let mut result = vec![0u8; 160];
        // answer = 123456789 at 8 decimals
        result[32 + 28..64].copy_from_slice(&123_456_789u32.to_be_bytes());
        let price = decode_answer(&result, 8).unwrap();
        assert!((price - 1.23456789).abs() < 1e-12);

        result[32] = 0xff;
        assert_eq!(decode_answer(&result, 8), None);
        assert_eq!(decode_answer(&[0u8; 16], 8), None);
    }

    #[test]
    fn test_decode_address() {
        let mut result = vec![0u8; 32];
        assert_eq!(decode_address(&result), None);
        result[31] = 0x01;
        assert_eq!(decode_address(&result).unwrap(), "0x0000000000000000000000000000000000000001");
    }
}
