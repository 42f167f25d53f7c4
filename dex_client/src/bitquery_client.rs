use crate::http::HttpFetcher;
use crate::{DexClientError, Result};
use config_manager::BitqueryConfig;
use lookup_core::parse_number;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Upper bound on transfers folded into the holder totals
const TRANSFER_LIMIT: u64 = 2500;

const TRANSFERS_QUERY: &str = r#"
query ($address: String!, $limit: Int!) {
  ethereum(network: ethereum) {
    transfers(
      amount: {gt: 0}
      currency: {is: $address}
      options: {limit: $limit}
    ) {
      receiver { address }
      amount
    }
  }
}
"#;

pub struct BitqueryClient {
    config: BitqueryConfig,
    http: Arc<dyn HttpFetcher>,
}

impl BitqueryClient {
    pub fn new(config: BitqueryConfig, http: Arc<dyn HttpFetcher>) -> Self {
        Self { config, http }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.api_key.is_empty()
    }

    /// Amount received per wallet across recent transfers of an ERC-20,
    /// largest first. The shares feed the top-5 concentration check.
    pub async fn holder_totals(&self, address: &str) -> Result<Vec<f64>> {
        let body = json!({
            "query": TRANSFERS_QUERY,
            "variables": {"address": address.to_lowercase(), "limit": TRANSFER_LIMIT},
        });

        debug!("🐋 Bitquery transfers for {}", address);
        let response = self
            .http
            .post_json(&self.config.url, &[("X-API-KEY", self.config.api_key.as_str())], &body)
            .await?
            .error_for_status()?;
        let parsed: Value = response.json()?;

        if let Some(errors) = parsed.get("errors").and_then(|e| e.as_array()).filter(|e| !e.is_empty()) {
            let message = errors[0]
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("GraphQL error")
                .to_string();
            return Err(DexClientError::ApiError { status: 200, message });
        }

        let transfers = parsed
            .pointer("/data/ethereum/transfers")
            .and_then(|t| t.as_array())
            .ok_or(DexClientError::NoDataAvailable)?;

        let mut per_holder: HashMap<String, f64> = HashMap::new();
        for transfer in transfers {
            let Some(receiver) = transfer.pointer("/receiver/address").and_then(|a| a.as_str()) else {
                continue;
            };
            let Some(amount) = transfer.get("amount").and_then(parse_number) else {
                continue;
            };
            *per_holder.entry(receiver.to_lowercase()).or_insert(0.0) += amount;
        }

        let mut totals: Vec<f64> = per_holder.into_values().collect();
        totals.sort_by(|a, b| b.total_cmp(a));
        debug!("Bitquery saw {} receiving wallets for {}", totals.len(), address);
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFetcher;
    use config_manager::SystemConfig;
    use serde_json::json;

    fn bitquery_url() -> String {
        SystemConfig::default().bitquery.url
    }

    fn client(http: MockFetcher) -> (BitqueryClient, Arc<MockFetcher>) {
        let http = Arc::new(http);
        let mut config = SystemConfig::default().bitquery;
        config.enabled = true;
        config.api_key = "key".to_string();
        (BitqueryClient::new(config, http.clone()), http)
    }

    #[tokio::test]
    async fn test_transfers_are_summed_per_receiver() {
        let (bitquery, http) = client(MockFetcher::new().with_json(
            &bitquery_url(),
            json!({"data": {"ethereum": {"transfers": [
                {"receiver": {"address": "0xAAA"}, "amount": 100.0},
                {"receiver": {"address": "0xbbb"}, "amount": "50"},
                {"receiver": {"address": "0xaaa"}, "amount": 25.0},
                {"receiver": {}, "amount": 999.0}
            ]}}}),
        ));

        let totals = bitquery.holder_totals("0xToken").await.unwrap();
        assert_eq!(totals, vec![125.0, 50.0]);

        let calls = http.calls();
        let body = calls[0].body.as_ref().unwrap();
        assert!(body["query"].as_str().unwrap().contains("receiver { address }"));
        assert_eq!(body["variables"]["address"], "0xtoken");
    }

    #[tokio::test]
    async fn test_graphql_errors_surface() {
        let (bitquery, _) = client(
            MockFetcher::new().with_json(&bitquery_url(), json!({"errors": [{"message": "quota exceeded"}]})),
        );
        match bitquery.holder_totals("0xabc").await {
            Err(DexClientError::ApiError { message, .. }) => assert_eq!(message, "quota exceeded"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
