//! Contract and ticker lookups over the upstream clients.
//!
//! [`PriceLookupClient`] walks the per-chain fallback chain and memoizes
//! successful reports, [`RiskAnnotator`] attaches the GoPlus score, and
//! [`LookupService`] is the facade front-ends talk to.

pub mod price_lookup;
pub mod risk_annotator;
pub mod service;
pub mod ticker;

pub use price_lookup::{PriceLookupClient, Providers};
pub use risk_annotator::RiskAnnotator;
pub use service::LookupService;
pub use ticker::TickerLookup;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config_manager::ConfigurationError),
    #[error("Client error: {0}")]
    Client(#[from] dex_client::DexClientError),
    #[error("Persistence error: {0}")]
    Persistence(#[from] persistence_layer::PersistenceError),
}

pub type Result<T> = std::result::Result<T, LookupError>;
