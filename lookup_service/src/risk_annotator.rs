use config_manager::SystemConfig;
use dex_client::{BitqueryClient, GoPlusClient, HttpFetcher};
use lookup_core::{score_security, wallet_concentration_penalty, Chain, RiskAnnotation, RuleSet, GOPLUS_V1};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Flag added when the wallet concentration check could not run
pub const CONCENTRATION_UNKNOWN_FLAG: &str = "Wallet concentration unknown";

/// Attaches a GoPlus risk score, plus a Bitquery wallet concentration
/// deduction on ethereum. Never fails: problems become annotations.
pub struct RiskAnnotator {
    goplus: GoPlusClient,
    bitquery: BitqueryClient,
    rule_set: RuleSet,
}

impl RiskAnnotator {
    pub fn new(goplus: GoPlusClient, bitquery: BitqueryClient) -> Self {
        Self {
            goplus,
            bitquery,
            rule_set: GOPLUS_V1,
        }
    }

    pub fn from_config(config: &SystemConfig, http: Arc<dyn HttpFetcher>) -> Self {
        Self::new(
            GoPlusClient::new(config.goplus.clone(), http.clone()),
            BitqueryClient::new(config.bitquery.clone(), http),
        )
    }

    pub async fn annotate(&self, chain: Chain, address: &str) -> RiskAnnotation {
        if !self.goplus.is_enabled() {
            return RiskAnnotation::Disabled;
        }
        if chain.goplus_chain_id().is_none() {
            debug!("No contract scan for {}", chain);
            return RiskAnnotation::NotCovered;
        }

        let flags = match self.goplus.token_security(chain, address).await {
            Ok(Some(flags)) => flags,
            Ok(None) => return RiskAnnotation::Unavailable("no security record".to_string()),
            Err(e) => {
                warn!("⚠️ GoPlus scan failed for {}: {}", address, e);
                return RiskAnnotation::Unavailable(e.to_string());
            }
        };

        let mut assessment = score_security(&flags, &self.rule_set);

        if chain == Chain::Ethereum && self.bitquery.is_enabled() {
            match self.bitquery.holder_totals(address).await {
                Ok(totals) => {
                    if let Some((points, flag)) = wallet_concentration_penalty(&totals) {
                        assessment.deduct(points, flag);
                    }
                }
                Err(e) => {
                    warn!("⚠️ Bitquery concentration check failed for {}: {}", address, e);
                    assessment.flags.push(CONCENTRATION_UNKNOWN_FLAG.to_string());
                }
            }
        }

        info!(
            "🛡️ Risk for {}: {}/100 ({} flags, {})",
            address,
            assessment.score,
            assessment.flags.len(),
            assessment.rule_set
        );
        RiskAnnotation::Assessed(assessment)
    }
}
