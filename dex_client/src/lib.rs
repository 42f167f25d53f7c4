// Upstream market-data and security clients
// Every client talks HTTP through the injectable `HttpFetcher` seam

pub mod birdeye_client;
pub mod bitquery_client;
pub mod chainlink;
pub mod coingecko_client;
pub mod dexscreener_client;
pub mod explorer_client;
pub mod goplus_client;
pub mod http;
pub mod solscan_client;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

// Re-export configs from config_manager
pub use config_manager::{
    BirdEyeConfig, BitqueryConfig, ChainlinkConfig, CoinGeckoConfig, DexScreenerConfig,
    ExplorerConfig, GoPlusConfig, HttpConfig, SolscanConfig,
};

pub use birdeye_client::BirdEyeClient;
pub use bitquery_client::BitqueryClient;
pub use chainlink::ChainlinkClient;
pub use coingecko_client::{normalize_ticker, CoinGeckoClient, CoinListEntry};
pub use dexscreener_client::{best_pair_on_chain, deepest_chain, DexScreenerClient};
pub use explorer_client::ExplorerClient;
pub use goplus_client::GoPlusClient;
pub use http::{with_path, HttpFetcher, HttpResponse, ReqwestFetcher};
pub use solscan_client::{SolscanClient, SolscanTokenMeta};
pub use types::{DexPair, DexToken, PairsResponse};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DexClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("No data available")]
    NoDataAvailable,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DexClientError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DexClientError::RateLimitExceeded)
            || matches!(self, DexClientError::ApiError { status: 429, .. })
    }
}

pub type Result<T> = std::result::Result<T, DexClientError>;
