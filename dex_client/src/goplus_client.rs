use crate::http::{with_query, HttpFetcher};
use crate::{DexClientError, Result};
use chrono::{DateTime, Duration, Utc};
use config_manager::GoPlusConfig;
use lookup_core::{Chain, SecurityFlags};
use serde::Deserialize;
use serde_json::{json, Value};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// GoPlus business code for "request limit reached"
const GOPLUS_RATE_LIMIT_CODE: i64 = 4029;

#[derive(Debug, Deserialize)]
struct TokenSecurityResponse {
    code: Option<i64>,
    message: Option<String>,
    result: Option<HashMap<String, HashMap<String, Value>>>,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    code: Option<i64>,
    message: Option<String>,
    result: Option<AccessTokenResult>,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResult {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct IssuedToken {
    value: String,
    refresh_at: DateTime<Utc>,
}

/// `sha1(app_key + time + app_secret)` as lower-case hex
pub fn sign_token_request(app_key: &str, time: i64, app_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{}{}{}", app_key, time, app_secret).as_bytes());
    hex::encode(hasher.finalize())
}

pub struct GoPlusClient {
    config: GoPlusConfig,
    http: Arc<dyn HttpFetcher>,
    issued: Mutex<Option<IssuedToken>>,
}

impl GoPlusClient {
    pub fn new(config: GoPlusConfig, http: Arc<dyn HttpFetcher>) -> Self {
        Self {
            config,
            http,
            issued: Mutex::new(None),
        }
    }

    /// Exchange the app key and secret for a bearer token
    async fn request_token(&self) -> Result<IssuedToken> {
        let now = Utc::now();
        let time = now.timestamp();
        let body = json!({
            "app_key": self.config.app_key,
            "time": time,
            "sign": sign_token_request(&self.config.app_key, time, &self.config.app_secret),
        });

        debug!("🔑 Requesting GoPlus access token");
        let url = format!("{}/token", self.config.api_base_url);
        let response = self.http.post_json(&url, &[], &body).await?.error_for_status()?;
        let parsed: AccessTokenResponse = response.json()?;

        match (parsed.code, parsed.result) {
            (Some(1) | None, Some(result)) if !result.access_token.is_empty() => {
                let lifetime = result.expires_in.unwrap_or(0) - self.config.token_refresh_margin_seconds as i64;
                info!("✅ GoPlus access token issued (expires in {:?}s)", result.expires_in);
                Ok(IssuedToken {
                    value: result.access_token,
                    refresh_at: now + Duration::seconds(lifetime.max(0)),
                })
            }
            (Some(GOPLUS_RATE_LIMIT_CODE), _) => Err(DexClientError::RateLimitExceeded),
            (code, _) => Err(DexClientError::ApiError {
                status: 200,
                message: format!(
                    "GoPlus token exchange failed (code {:?}): {}",
                    code,
                    parsed.message.unwrap_or_default()
                ),
            }),
        }
    }

    /// Token for the `Authorization` header. A configured token wins; with
    /// app credentials the exchanged token is reused until shortly before it
    /// expires. `None` means anonymous access.
    async fn access_token(&self) -> Option<String> {
        if !self.config.access_token.is_empty() {
            return Some(self.config.access_token.clone());
        }
        if !self.config.has_app_credentials() {
            return None;
        }

        let mut issued = self.issued.lock().await;
        if let Some(token) = issued.as_ref().filter(|t| Utc::now() < t.refresh_at) {
            return Some(token.value.clone());
        }

        match self.request_token().await {
            Ok(token) => {
                let value = token.value.clone();
                *issued = Some(token);
                Some(value)
            }
            Err(e) => {
                warn!("⚠️ GoPlus token exchange failed, continuing anonymously: {}", e);
                None
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Raw security flags for one token. `Ok(None)` when GoPlus has no record
    /// or the chain is not covered.
    pub async fn token_security(&self, chain: Chain, address: &str) -> Result<Option<SecurityFlags>> {
        let Some(chain_id) = chain.goplus_chain_id() else {
            return Ok(None);
        };

        let url = with_query(
            &format!("{}/token_security/{}", self.config.api_base_url, chain_id),
            &[("contract_addresses", address)],
        )?;

        let token = self.access_token().await;
        let headers: Vec<(&str, &str)> = match token.as_deref() {
            Some(token) => vec![("Authorization", token)],
            None => Vec::new(),
        };

        debug!("🛡️ GoPlus token_security {}:{}", chain, address);
        let response = self.http.get(&url, &headers).await?.error_for_status()?;
        let parsed: TokenSecurityResponse = response.json()?;

        match parsed.code {
            Some(1) | None => {}
            Some(GOPLUS_RATE_LIMIT_CODE) => return Err(DexClientError::RateLimitExceeded),
            Some(code) => {
                return Err(DexClientError::ApiError {
                    status: 200,
                    message: format!("GoPlus code {}: {}", code, parsed.message.unwrap_or_default()),
                })
            }
        }

        let wanted = address.to_lowercase();
        let record = parsed.result.and_then(|mut records| {
            records.remove(&wanted).or_else(|| {
                let key = records.keys().find(|k| k.to_lowercase() == wanted)?.clone();
                records.remove(&key)
            })
        });

        match record {
            Some(fields) if !fields.is_empty() => {
                info!("✅ GoPlus returned {} security fields for {}", fields.len(), address);
                Ok(Some(SecurityFlags(fields)))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_token_request() {
        assert_eq!(
            sign_token_request("key", 1_700_000_000, "secret"),
            "9f48e9fc84a269c7dc7bcef7019050b5e30e04be"
        );
    }
}
