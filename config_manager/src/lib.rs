use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] ConfigError),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// General system settings
    pub system: SystemSettings,

    /// Lookup result cache
    pub cache: CacheConfig,

    /// Shared HTTP client settings
    pub http: HttpConfig,

    /// DexScreener API configuration (primary price source)
    pub dexscreener: DexScreenerConfig,

    /// BirdEye API configuration (sui and solana fallback)
    pub birdeye: BirdEyeConfig,

    /// Etherscan-family explorers (ethereum and base fallback)
    pub etherscan: ExplorerConfig,
    pub basescan: ExplorerConfig,

    /// Solscan API configuration (solana fallback and holder enrichment)
    pub solscan: SolscanConfig,

    /// CoinGecko API configuration (ticker lookups)
    pub coingecko: CoinGeckoConfig,

    /// GoPlus token security API
    pub goplus: GoPlusConfig,

    /// Bitquery GraphQL indexer (wallet concentration)
    pub bitquery: BitqueryConfig,

    /// Chainlink feed registry read over JSON-RPC
    pub chainlink: ChainlinkConfig,

    /// Redis-backed interaction log
    pub interaction_log: InteractionLogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Deployment environment name ("local", "production", ...)
    pub environment: String,

    /// Chains the resolver accepts. Values outside the built-in set are ignored.
    pub supported_chains: Vec<String>,

    /// Agent name written to the interaction log
    pub agent_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached lookups
    pub capacity: usize,

    /// Entry lifetime in seconds
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,

    /// User-Agent header sent to every upstream
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexScreenerConfig {
    /// DexScreener API base URL (including the `/latest/dex` prefix)
    pub api_base_url: String,

    /// Public site used for deep links
    pub site_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirdEyeConfig {
    /// BirdEye API key
    pub api_key: String,

    /// BirdEye API base URL
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Explorer API key
    pub api_key: String,

    /// Explorer API endpoint (the `/api` path)
    pub api_base_url: String,

    /// Public site used for deep links
    pub site_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolscanConfig {
    /// Solscan API key (optional for the public API)
    pub api_key: String,

    /// Solscan public API base URL
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinGeckoConfig {
    /// CoinGecko API base URL
    pub api_base_url: String,

    /// Backoff delays applied to HTTP 429 responses, in milliseconds
    pub rate_limit_delays_ms: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoPlusConfig {
    /// Enable the contract risk annotation
    pub enabled: bool,

    /// GoPlus API base URL
    pub api_base_url: String,

    /// Pre-issued access token; wins over the app key exchange
    pub access_token: String,

    /// App credentials for the `/token` exchange; empty means anonymous access
    pub app_key: String,
    pub app_secret: String,

    /// Refresh the exchanged token this many seconds before it expires
    pub token_refresh_margin_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitqueryConfig {
    /// Enable the wallet concentration check (requires an API key)
    pub enabled: bool,

    /// GraphQL endpoint
    pub url: String,

    /// Bitquery API key
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainlinkConfig {
    /// Ethereum JSON-RPC endpoint; the feed lookup is skipped when unset
    pub rpc_url: Option<String>,

    /// Feed Registry contract address
    pub feed_registry: String,

    /// Denomination address for USD
    pub usd_denomination: String,

    /// Answer decimals of USD feeds
    pub decimals: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionLogConfig {
    /// Enable writing lookups to redis
    pub enabled: bool,

    /// Redis connection URL
    pub redis_url: String,

    /// Redis list key
    pub list_key: String,

    /// Maximum number of retained records
    pub max_entries: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            system: SystemSettings {
                environment: "local".to_string(),
                supported_chains: vec![
                    "ethereum".to_string(),
                    "base".to_string(),
                    "solana".to_string(),
                    "sui".to_string(),
                    "abstract".to_string(),
                ],
                agent_name: "contract_lookup".to_string(),
            },
            cache: CacheConfig {
                capacity: 100,
                ttl_seconds: 300,
            },
            http: HttpConfig {
                request_timeout_seconds: 10,
                user_agent: "contract_lookup/0.1".to_string(),
            },
            dexscreener: DexScreenerConfig {
                api_base_url: "https://api.dexscreener.com/latest/dex".to_string(),
                site_url: "https://dexscreener.com".to_string(),
            },
            birdeye: BirdEyeConfig {
                api_key: "".to_string(), // Must be set in .env or config file
                api_base_url: "https://public-api.birdeye.so".to_string(),
            },
            etherscan: ExplorerConfig {
                api_key: "".to_string(),
                api_base_url: "https://api.etherscan.io/api".to_string(),
                site_url: "https://etherscan.io".to_string(),
            },
            basescan: ExplorerConfig {
                api_key: "".to_string(),
                api_base_url: "https://api.basescan.org/api".to_string(),
                site_url: "https://basescan.org".to_string(),
            },
            solscan: SolscanConfig {
                api_key: "".to_string(),
                api_base_url: "https://public-api.solscan.io".to_string(),
            },
            coingecko: CoinGeckoConfig {
                api_base_url: "https://api.coingecko.com/api/v3".to_string(),
                rate_limit_delays_ms: vec![1000, 2000, 4000],
            },
            goplus: GoPlusConfig {
                enabled: true,
                api_base_url: "https://api.gopluslabs.io/api/v1".to_string(),
                access_token: "".to_string(),
                app_key: "".to_string(),
                app_secret: "".to_string(),
                token_refresh_margin_seconds: 60,
            },
            bitquery: BitqueryConfig {
                enabled: false, // Disabled by default until API key is provided
                url: "https://graphql.bitquery.io".to_string(),
                api_key: "".to_string(),
            },
            chainlink: ChainlinkConfig {
                rpc_url: None,
                feed_registry: "0x47Fb2585D2C56Fe188D0E6ec628a38b74fCeeeDf".to_string(),
                usd_denomination: "0x0000000000000000000000000000000000000348".to_string(),
                decimals: 8,
            },
            interaction_log: InteractionLogConfig {
                enabled: false,
                redis_url: "redis://127.0.0.1:6379".to_string(),
                list_key: "lookup:interactions".to_string(),
                max_entries: 10_000,
            },
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Cache capacity must be greater than 0".to_string(),
            ));
        }

        if self.ttl_seconds == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Cache TTL must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl GoPlusConfig {
    pub fn has_app_credentials(&self) -> bool {
        !self.app_key.is_empty() && !self.app_secret.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_key.is_empty() != self.app_secret.is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "GoPlus app_key and app_secret must be set together".to_string(),
            ));
        }

        Ok(())
    }
}

impl BitqueryConfig {
    /// Validate Bitquery configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.api_key.is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "Bitquery API key is required when Bitquery is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

impl SystemConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config_builder = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&SystemConfig::default())?);

        if config_path.as_ref().exists() {
            info!(
                "Loading configuration from: {}",
                config_path.as_ref().display()
            );
            config_builder = config_builder.add_source(File::from(config_path.as_ref()));
        } else {
            debug!("Config file not found, using defaults and environment variables");
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix("LOOKUP")
                .try_parsing(true)
                .separator("__")
                .list_separator(","),
        );

        let mut system_config: SystemConfig = config_builder.build()?.try_deserialize()?;

        system_config.apply_provider_env(|name| std::env::var(name).ok());

        // Canonical chain resolution happens in lookup_core; only tidy here
        for chain in system_config.system.supported_chains.iter_mut() {
            *chain = chain.trim().to_lowercase();
        }
        system_config.system.supported_chains.retain(|c| !c.is_empty());

        system_config.validate()?;

        Ok(system_config)
    }

    /// Overlay the provider variables the bots have always read
    /// (`ETHERSCAN_API_KEY`, `BIRDEYE_API_KEY`, ...). Non-empty values win
    /// over file and `LOOKUP__*` settings.
    pub fn apply_provider_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ETHERSCAN_API_KEY") {
            self.etherscan.api_key = v;
        }
        if let Some(v) = get("BASESCAN_API_KEY") {
            self.basescan.api_key = v;
        }
        if let Some(v) = get("SOLSCAN_API_KEY") {
            self.solscan.api_key = v;
        }
        if let Some(v) = get("BIRDEYE_API_KEY") {
            self.birdeye.api_key = v;
        }
        if let Some(v) = get("GOPLUS_ACCESS_TOKEN") {
            self.goplus.access_token = v;
        }
        if let Some(v) = get("GOPLUS_APP_KEY") {
            self.goplus.app_key = v;
        }
        if let Some(v) = get("GOPLUS_APP_SECRET") {
            self.goplus.app_secret = v;
        }
        if let Some(v) = get("BITQUERY_API_KEY") {
            self.bitquery.api_key = v;
            self.bitquery.enabled = true;
        }
        if let Some(v) = get("INFURA_URL") {
            self.chainlink.rpc_url = Some(v);
        }
        if let Some(v) = get("REDIS_URL") {
            self.interaction_log.redis_url = v;
            self.interaction_log.enabled = true;
        }
        if let Some(v) = get("ENVIRONMENT") {
            self.system.environment = v;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        self.goplus.validate()?;
        self.bitquery.validate()?;

        if self.http.request_timeout_seconds == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.system.supported_chains.is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "At least one supported chain is required".to_string(),
            ));
        }

        if self.coingecko.rate_limit_delays_ms.is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "CoinGecko rate limit delays cannot be empty".to_string(),
            ));
        }

        if self.interaction_log.enabled && self.interaction_log.max_entries == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Interaction log max_entries must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get configuration as a JSON value, with secrets blanked out
    pub fn to_redacted_json(&self) -> serde_json::Value {
        let mut redacted = self.clone();
        for key in [
            &mut redacted.birdeye.api_key,
            &mut redacted.etherscan.api_key,
            &mut redacted.basescan.api_key,
            &mut redacted.solscan.api_key,
            &mut redacted.goplus.access_token,
            &mut redacted.goplus.app_secret,
            &mut redacted.bitquery.api_key,
        ] {
            if !key.is_empty() {
                *key = "***".to_string();
            }
        }
        serde_json::to_value(redacted).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_validate() {
        let config = SystemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.capacity, 100);
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.http.request_timeout_seconds, 10);
        assert_eq!(config.coingecko.rate_limit_delays_ms, vec![1000, 2000, 4000]);
    }

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let mut config = SystemConfig::default();
        config.cache.capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_bitquery_enabled_without_key_rejected() {
        let mut config = SystemConfig::default();
        config.bitquery.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("ETHERSCAN_API_KEY", "eth-key"),
            ("BITQUERY_API_KEY", "bq-key"),
            ("INFURA_URL", "https://mainnet.example/rpc"),
            ("BIRDEYE_API_KEY", "   "),
        ]
        .into_iter()
        .collect();

        let mut config = SystemConfig::default();
        config.apply_provider_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.etherscan.api_key, "eth-key");
        assert_eq!(config.bitquery.api_key, "bq-key");
        assert!(config.bitquery.enabled);
        assert_eq!(
            config.chainlink.rpc_url.as_deref(),
            Some("https://mainnet.example/rpc")
        );
        // Blank values are ignored
        assert!(config.birdeye.api_key.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_redacted_json_hides_keys() {
        let mut config = SystemConfig::default();
        config.birdeye.api_key = "secret".to_string();
        let json = config.to_redacted_json();
        assert_eq!(json["birdeye"]["api_key"], "***");
        assert_eq!(json["etherscan"]["api_key"], "");
    }

    #[test]
    fn test_goplus_credentials() {
        let vars: HashMap<&str, &str> = [("GOPLUS_APP_KEY", "app"), ("GOPLUS_APP_SECRET", "shh")]
            .into_iter()
            .collect();
        let mut config = SystemConfig::default();
        assert!(!config.goplus.has_app_credentials());

        config.apply_provider_env(|name| vars.get(name).map(|v| v.to_string()));
        assert!(config.goplus.has_app_credentials());
        assert!(config.validate().is_ok());
        assert_eq!(config.to_redacted_json()["goplus"]["app_secret"], "***");

        config.goplus.app_secret.clear();
        assert!(config.validate().is_err());
    }
}
