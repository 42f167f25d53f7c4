use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Unsupported chain: '{0}'")]
    Unsupported(String),
}

/// Chains the lookup pipeline knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Base,
    Solana,
    Sui,
    Abstract,
}

impl Chain {
    pub const ALL: [Chain; 5] = [
        Chain::Ethereum,
        Chain::Base,
        Chain::Solana,
        Chain::Sui,
        Chain::Abstract,
    ];

    /// Canonical lower-case id; also the DexScreener `chainId`
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Base => "base",
            Chain::Solana => "solana",
            Chain::Sui => "sui",
            Chain::Abstract => "abstract",
        }
    }

    /// Human-readable label used in rendered messages
    pub fn label(&self) -> &'static str {
        match self {
            Chain::Ethereum => "Ethereum",
            Chain::Base => "Base",
            Chain::Solana => "Solana",
            Chain::Sui => "Sui",
            Chain::Abstract => "Abstract",
        }
    }

    /// GoPlus `token_security` chain id. Non-EVM chains are not covered.
    pub fn goplus_chain_id(&self) -> Option<&'static str> {
        match self {
            Chain::Ethereum => Some("1"),
            Chain::Base => Some("8453"),
            Chain::Abstract => Some("2741"),
            Chain::Solana | Chain::Sui => None,
        }
    }

    pub fn is_evm(&self) -> bool {
        matches!(self, Chain::Ethereum | Chain::Base | Chain::Abstract)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_chain(s)
    }
}

/// Resolve free-text chain input (case-insensitive, common aliases accepted)
pub fn resolve_chain(input: &str) -> Result<Chain, ChainError> {
    match input.trim().to_lowercase().as_str() {
        "ethereum" | "eth" => Ok(Chain::Ethereum),
        "base" => Ok(Chain::Base),
        "solana" | "sol" => Ok(Chain::Solana),
        "sui" => Ok(Chain::Sui),
        "abstract" | "abs" => Ok(Chain::Abstract),
        _ => Err(ChainError::Unsupported(input.trim().to_string())),
    }
}

/// Resolve against an allow-list (the configured subset of chains)
pub fn resolve_supported_chain(input: &str, allowed: &[Chain]) -> Result<Chain, ChainError> {
    let chain = resolve_chain(input)?;
    if allowed.contains(&chain) {
        Ok(chain)
    } else {
        Err(ChainError::Unsupported(input.trim().to_string()))
    }
}

fn evm_address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid regex"))
}

fn bare_hex40_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{40}$").expect("valid regex"))
}

fn sui_object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{64}(::\w+::\w+)?$").expect("valid regex"))
}

fn base58_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("valid regex")
    })
}

/// Guess the chain from the address shape alone.
///
/// This is a fuzzy heuristic: a 42-char `0x` address is valid on ethereum,
/// base and abstract alike, and ethereum is returned for all of them.
pub fn guess_chain(address: &str) -> Option<Chain> {
    let address = address.trim();

    if sui_object_re().is_match(address) {
        return Some(Chain::Sui);
    }
    if evm_address_re().is_match(address) || bare_hex40_re().is_match(address) {
        return Some(Chain::Ethereum);
    }
    if base58_re().is_match(address) {
        return Some(Chain::Solana);
    }
    None
}

/// Loose check used when free text might be a contract address
pub fn looks_like_contract(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.contains(|c: char| c.is_whitespace() || c == ',' || c == ';') {
        return false;
    }

    // Sui coin types carry a `::module::NAME` suffix
    let head = text.split("::").next().unwrap_or(text);

    if evm_address_re().is_match(head) {
        return true;
    }
    head.len() > 30 && head.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDC_ETH: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
    const USDC_SOL: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    const SUI_COIN: &str =
        "0x06864a6f921804860930db6ddbe2e16acdf8504495ea7481637a1c8b9a8fe54b::cetus::CETUS";

    #[test]
    fn test_resolve_chain_case_insensitive() {
        assert_eq!(resolve_chain("Ethereum").unwrap(), Chain::Ethereum);
        assert_eq!(resolve_chain("  SOL ").unwrap(), Chain::Solana);
        assert_eq!(resolve_chain("abs").unwrap(), Chain::Abstract);
        assert_eq!("base".parse::<Chain>().unwrap(), Chain::Base);
    }

    #[test]
    fn test_resolve_chain_unsupported() {
        assert_eq!(
            resolve_chain("dogechain"),
            Err(ChainError::Unsupported("dogechain".to_string()))
        );
    }

    #[test]
    fn test_resolve_supported_chain_respects_allow_list() {
        let allowed = [Chain::Ethereum, Chain::Base];
        assert!(resolve_supported_chain("base", &allowed).is_ok());
        assert!(resolve_supported_chain("solana", &allowed).is_err());
    }

    #[test]
    fn test_guess_chain() {
        assert_eq!(guess_chain(USDC_ETH), Some(Chain::Ethereum));
        assert_eq!(guess_chain(&USDC_ETH[2..]), Some(Chain::Ethereum));
        assert_eq!(guess_chain(USDC_SOL), Some(Chain::Solana));
        assert_eq!(guess_chain(SUI_COIN), Some(Chain::Sui));
        assert_eq!(guess_chain(&SUI_COIN[..66]), Some(Chain::Sui));
        assert_eq!(guess_chain("0x1234"), None);
        assert_eq!(guess_chain("hello world"), None);
    }

    #[test]
    fn test_looks_like_contract() {
        assert!(looks_like_contract(USDC_ETH));
        assert!(looks_like_contract(USDC_SOL));
        assert!(looks_like_contract(SUI_COIN));
        assert!(!looks_like_contract("what is the price of eth"));
        assert!(!looks_like_contract("0xabc,0xdef"));
        assert!(!looks_like_contract("short"));
    }

    #[test]
    fn test_goplus_coverage() {
        assert_eq!(Chain::Base.goplus_chain_id(), Some("8453"));
        assert_eq!(Chain::Solana.goplus_chain_id(), None);
        assert!(Chain::Abstract.is_evm());
        assert!(!Chain::Sui.is_evm());
    }
}
