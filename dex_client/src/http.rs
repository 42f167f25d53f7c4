use crate::{DexClientError, Result};
use async_trait::async_trait;
use config_manager::HttpConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Status and raw body of an upstream response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Map non-2xx statuses into the client error space
    pub fn error_for_status(self) -> Result<Self> {
        match self.status {
            429 => Err(DexClientError::RateLimitExceeded),
            s if (200..300).contains(&s) => Ok(self),
            s => Err(DexClientError::ApiError {
                status: s,
                message: truncate(&self.body, 200),
            }),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// Outbound HTTP seam shared by every provider client
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse>;

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse>;
}

pub struct ReqwestFetcher {
    http_client: Client,
}

impl ReqwestFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        debug!("GET {}", redact_url(url));

        let mut request = self.http_client.get(url).header("accept", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        debug!("POST {}", redact_url(url));

        let mut request = self.http_client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Strip credential query parameters before a URL reaches the logs
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(k, v)| {
                    let secret = matches!(k.as_ref(), "apikey" | "api_key" | "access_token");
                    (k.into_owned(), if secret { "***".to_string() } else { v.into_owned() })
                })
                .collect();
            if !pairs.is_empty() {
                parsed.query_pairs_mut().clear().extend_pairs(pairs);
            }
            parsed.to_string()
        }
        Err(_) => raw.to_string(),
    }
}

/// Build `base` + query string with proper escaping
pub fn with_query(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let url = url::Url::parse_with_params(base, params)
        .map_err(|e| DexClientError::InvalidResponse(format!("Bad URL {}: {}", base, e)))?;
    Ok(url.to_string())
}

/// Append percent-encoded path segments to `base`. Upstream identifiers
/// can carry `/`, `?` or `#`, which must not change the request.
pub fn with_path(base: &str, segments: &[&str]) -> Result<String> {
    let mut url = url::Url::parse(base)
        .map_err(|e| DexClientError::InvalidResponse(format!("Bad URL {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| DexClientError::InvalidResponse(format!("URL cannot take a path: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}
