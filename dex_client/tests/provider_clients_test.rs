use config_manager::SystemConfig;
use dex_client::mock::{MockFetcher, MockReply};
use dex_client::goplus_client::sign_token_request;
use dex_client::{
    best_pair_on_chain, deepest_chain, ChainlinkClient, CoinGeckoClient, DexClientError, DexScreenerClient, ExplorerClient,
    GoPlusClient, HttpResponse,
};
use lookup_core::{Chain, QuoteSource};
use serde_json::json;
use std::sync::Arc;

const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

fn pairs_body() -> serde_json::Value {
    json!({
        "schemaVersion": "1.0.0",
        "pairs": [
            {
                "chainId": "bsc",
                "url": "https://dexscreener.com/bsc/0xpair",
                "baseToken": {"address": WETH, "name": "Wrapped Ether", "symbol": "WETH"},
                "priceUsd": "3000.10",
                "liquidity": {"usd": 90_000_000.0}
            },
            {
                "chainId": "ethereum",
                "url": "https://dexscreener.com/ethereum/0xdeep",
                "baseToken": {"address": WETH, "name": "Wrapped Ether", "symbol": "WETH"},
                "priceUsd": "3001.55",
                "volume": {"h24": 1_250_000.5, "h1": 40_000},
                "priceChange": {"h24": -2.5},
                "liquidity": {"usd": "12500000"},
                "fdv": 9_000_000_000u64,
                "pairCreatedAt": 1_600_000_000_000i64
            },
            {
                "chainId": "ethereum",
                "baseToken": {"address": WETH, "name": "Wrapped Ether", "symbol": "WETH"},
                "priceUsd": "2999.00",
                "liquidity": {"usd": 1000}
            }
        ]
    })
}

#[tokio::test]
async fn test_token_pairs_pick_deepest_pool_on_requested_chain() {
    let config = SystemConfig::default();
    let base = config.dexscreener.api_base_url.clone();
    let http = Arc::new(MockFetcher::new().with_json(&format!("{}/tokens/", base), pairs_body()));
    let client = DexScreenerClient::new(config.dexscreener, http.clone());

    let pairs = client.get_token_pairs(WETH).await.unwrap();
    assert_eq!(pairs.len(), 3);

    let best = best_pair_on_chain(&pairs, Chain::Ethereum).unwrap();
    let quote = client.to_quote(best, Chain::Ethereum, WETH).unwrap();

    assert_eq!(quote.symbol, "WETH");
    assert_eq!(quote.price_usd, Some(3001.55));
    assert_eq!(quote.liquidity_usd, Some(12_500_000.0));
    assert_eq!(quote.volume_1h_usd, Some(40_000.0));
    assert_eq!(quote.price_change_24h_pct, Some(-2.5));
    assert_eq!(quote.source, QuoteSource::DexScreener);
    assert_eq!(quote.source_url, "https://dexscreener.com/ethereum/0xdeep");
    assert!(quote.pair_created_at.is_some());
    assert_eq!(http.calls_to(&format!("{}/tokens/{}", base, WETH)), 1);
}

#[tokio::test]
async fn test_pair_endpoint_without_pairs_is_empty() {
    let config = SystemConfig::default();
    let base = config.dexscreener.api_base_url.clone();
    let http = Arc::new(MockFetcher::new().with_json(&format!("{}/pairs/", base), json!({"pairs": null})));
    let client = DexScreenerClient::new(config.dexscreener, http);

    assert!(client.get_pair(Chain::Base, "0xabc").await.unwrap().is_none());
}

#[tokio::test]
async fn test_dexscreener_429_maps_to_rate_limit() {
    let config = SystemConfig::default();
    let http = Arc::new(MockFetcher::new().with_response(&config.dexscreener.api_base_url, 429, "slow down"));
    let client = DexScreenerClient::new(config.dexscreener, http);

    let err = client.search_pairs("pepe").await.unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_etherscan_verified_contract_and_missing_source() {
    let config = SystemConfig::default();
    let api = config.etherscan.api_base_url.clone();
    let http = Arc::new(MockFetcher::new().with_json(
        &api,
        json!({"status": "1", "message": "OK", "result": [{"ContractName": "WETH9", "SourceCode": "..."}]}),
    ));
    let client = ExplorerClient::etherscan(config.etherscan.clone(), http);

    let quote = client.get_verified_contract(WETH).await.unwrap().unwrap();
    assert_eq!(quote.name, "WETH9");
    assert_eq!(quote.source, QuoteSource::Etherscan);
    assert_eq!(quote.note.as_deref(), Some("📜 Verified on Etherscan."));

    let unverified = Arc::new(MockFetcher::new().with_json(
        &api,
        json!({"status": "1", "message": "OK", "result": [{"ContractName": "", "SourceCode": ""}]}),
    ));
    let client = ExplorerClient::etherscan(config.etherscan, unverified);
    assert!(client.get_verified_contract(WETH).await.unwrap().is_none());
}

#[tokio::test]
async fn test_explorer_rate_limit_message() {
    let config = SystemConfig::default();
    let http = Arc::new(MockFetcher::new().with_json(
        &config.basescan.api_base_url,
        json!({"status": "0", "message": "NOTOK", "result": "Max rate limit reached"}),
    ));
    let client = ExplorerClient::basescan(config.basescan, http);

    assert!(matches!(
        client.get_token_info("0xabc").await,
        Err(DexClientError::RateLimitExceeded)
    ));
}

#[tokio::test]
async fn test_goplus_record_lookup_is_case_insensitive() {
    let config = SystemConfig::default();
    let http = Arc::new(MockFetcher::new().with_json(
        &config.goplus.api_base_url,
        json!({
            "code": 1,
            "message": "OK",
            "result": {
                WETH.to_lowercase(): {"is_honeypot": "0", "is_mintable": "1", "buy_tax": "0.05"}
            }
        }),
    ));
    let client = GoPlusClient::new(config.goplus, http.clone());

    let flags = client.token_security(Chain::Ethereum, WETH).await.unwrap().unwrap();
    assert_eq!(flags.get_str("is_mintable"), Some("1"));
    assert!(http.calls()[0].url.contains("/token_security/1"));
}

#[tokio::test]
async fn test_goplus_skips_uncovered_chain_and_maps_codes() {
    let config = SystemConfig::default();
    let http = Arc::new(MockFetcher::new().with_json(
        &config.goplus.api_base_url,
        json!({"code": 4029, "message": "too many requests", "result": {}}),
    ));
    let client = GoPlusClient::new(config.goplus, http.clone());

    assert!(client.token_security(Chain::Sui, "0x2::sui::SUI").await.unwrap().is_none());
    assert_eq!(http.call_count(), 0);

    assert!(matches!(
        client.token_security(Chain::Ethereum, WETH).await,
        Err(DexClientError::RateLimitExceeded)
    ));
}

fn goplus_with_app_credentials() -> (SystemConfig, String) {
    let mut config = SystemConfig::default();
    config.goplus.app_key = "app".to_string();
    config.goplus.app_secret = "shh".to_string();
    let base = config.goplus.api_base_url.clone();
    (config, base)
}

fn security_record() -> serde_json::Value {
    json!({"code": 1, "message": "OK", "result": {WETH.to_lowercase(): {"is_honeypot": "0"}}})
}

#[tokio::test]
async fn test_goplus_exchanges_app_key_once_for_reused_token() {
    let (config, base) = goplus_with_app_credentials();
    let http = Arc::new(
        MockFetcher::new()
            .with_json(
                &format!("{}/token", base),
                json!({"code": 1, "message": "OK", "result": {"access_token": "tok-1", "expires_in": 7200}}),
            )
            .with_json(&format!("{}/token_security", base), security_record()),
    );
    let client = GoPlusClient::new(config.goplus, http.clone());

    assert!(client.token_security(Chain::Ethereum, WETH).await.unwrap().is_some());
    assert!(client.token_security(Chain::Base, WETH).await.unwrap().is_some());

    let calls = http.calls();
    let exchanges: Vec<_> = calls.iter().filter(|c| c.method == "POST").collect();
    assert_eq!(exchanges.len(), 1);
    assert_eq!(exchanges[0].url, format!("{}/token", base));

    let body = exchanges[0].body.as_ref().unwrap();
    let time = body["time"].as_i64().unwrap();
    assert_eq!(body["app_key"], "app");
    assert_eq!(body["sign"], sign_token_request("app", time, "shh"));

    let lookups: Vec<_> = calls.iter().filter(|c| c.method == "GET").collect();
    assert_eq!(lookups.len(), 2);
    assert!(lookups.iter().all(|c| c.header("Authorization") == Some("tok-1")));
    assert!(lookups.iter().all(|c| !c.url.contains("tok-1")));
}

#[tokio::test]
async fn test_goplus_refreshes_token_near_expiry() {
    let (config, base) = goplus_with_app_credentials();
    let http = Arc::new(
        MockFetcher::new()
            .with_sequence(
                &format!("{}/token", base),
                vec![
                    MockReply::Respond(HttpResponse::new(
                        200,
                        json!({"code": 1, "result": {"access_token": "short", "expires_in": 30}}).to_string(),
                    )),
                    MockReply::Respond(HttpResponse::new(
                        200,
                        json!({"code": 1, "result": {"access_token": "fresh", "expires_in": 7200}}).to_string(),
                    )),
                ],
            )
            .with_json(&format!("{}/token_security", base), security_record()),
    );
    let client = GoPlusClient::new(config.goplus, http.clone());

    client.token_security(Chain::Ethereum, WETH).await.unwrap();
    client.token_security(Chain::Ethereum, WETH).await.unwrap();
    client.token_security(Chain::Ethereum, WETH).await.unwrap();

    let calls = http.calls();
    assert_eq!(calls.iter().filter(|c| c.method == "POST").count(), 2);
    let tokens: Vec<_> = calls
        .iter()
        .filter(|c| c.method == "GET")
        .map(|c| c.header("Authorization").unwrap_or_default().to_string())
        .collect();
    assert_eq!(tokens, vec!["short", "fresh", "fresh"]);
}

#[tokio::test]
async fn test_goplus_failed_exchange_falls_back_to_anonymous() {
    let (config, base) = goplus_with_app_credentials();
    let http = Arc::new(
        MockFetcher::new()
            .with_json(&format!("{}/token", base), json!({"code": 4012, "message": "signature verification failure"}))
            .with_json(&format!("{}/token_security", base), security_record()),
    );
    let client = GoPlusClient::new(config.goplus, http.clone());

    assert!(client.token_security(Chain::Ethereum, WETH).await.unwrap().is_some());
    let lookup = http.calls().into_iter().find(|c| c.method == "GET").unwrap();
    assert_eq!(lookup.header("Authorization"), None);
}

#[tokio::test]
async fn test_dexscreener_encodes_address_in_path() {
    let config = SystemConfig::default();
    let base = config.dexscreener.api_base_url.clone();
    let http = Arc::new(MockFetcher::new().with_json(&base, json!({"pairs": []})));
    let client = DexScreenerClient::new(config.dexscreener, http.clone());

    client.get_token_pairs("0xabc#frag?x=1").await.unwrap();
    client.get_pair(Chain::Base, "0xabc/../search").await.unwrap();

    let urls: Vec<String> = http.calls().into_iter().map(|c| c.url).collect();
    assert_eq!(urls[0], format!("{}/tokens/0xabc%23frag%3Fx=1", base));
    assert_eq!(urls[1], format!("{}/pairs/base/0xabc%2F..%2Fsearch", base));
}

#[test]
fn test_deepest_chain_among_allowed() {
    let pairs: Vec<dex_client::DexPair> = serde_json::from_value(json!([
        {"chainId": "bsc", "liquidity": {"usd": 90_000_000.0}},
        {"chainId": "ethereum", "liquidity": {"usd": 5_000.0}},
        {"chainId": "base", "liquidity": {"usd": "750000"}},
        {"chainId": "abstract", "liquidity": {"usd": 1_000.0}}
    ]))
    .unwrap();

    let evm = [Chain::Ethereum, Chain::Base, Chain::Abstract];
    assert_eq!(deepest_chain(&pairs, &evm), Some(Chain::Base));
    assert_eq!(deepest_chain(&pairs, &[Chain::Ethereum, Chain::Abstract]), Some(Chain::Ethereum));
    assert_eq!(deepest_chain(&pairs, &[Chain::Solana]), None);
}

fn rpc_result(bytes: &[u8]) -> MockReply {
    MockReply::Respond(HttpResponse::new(
        200,
        json!({"jsonrpc": "2.0", "id": 1, "result": format!("0x{}", hex::encode(bytes))}).to_string(),
    ))
}

#[tokio::test]
async fn test_chainlink_feed_lookup_over_rpc() {
    let mut config = SystemConfig::default().chainlink;
    config.rpc_url = Some("http://rpc.test".to_string());

    let mut feed = [0u8; 32];
    feed[31] = 0x42;
    let mut round = vec![0u8; 160];
    // 3000.5 USD at 8 decimals
    round[56..64].copy_from_slice(&300_050_000_000u64.to_be_bytes());

    let http = Arc::new(MockFetcher::new().with_sequence("http://rpc.test", vec![rpc_result(&feed), rpc_result(&round)]));
    let client = ChainlinkClient::new(config, http.clone());
    assert!(client.is_configured());

    let quote = client.get_quote(WETH).await.unwrap().unwrap();
    assert_eq!(quote.source, QuoteSource::Chainlink);
    assert!((quote.price_usd.unwrap() - 3000.5).abs() < 1e-9);

    let calls = http.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.method == "POST"));
    let second_to = calls[1].body.as_ref().unwrap()["params"][0]["to"].as_str().unwrap().to_string();
    assert_eq!(second_to, "0x0000000000000000000000000000000000000042");
}

#[tokio::test]
async fn test_chainlink_revert_means_no_feed() {
    let mut config = SystemConfig::default().chainlink;
    config.rpc_url = Some("http://rpc.test".to_string());
    let http = Arc::new(MockFetcher::new().with_json(
        "http://rpc.test",
        json!({"jsonrpc": "2.0", "id": 1, "error": {"code": 3, "message": "execution reverted: Feed not found"}}),
    ));
    let client = ChainlinkClient::new(config, http);

    assert!(client.get_usd_price(WETH).await.unwrap().is_none());
}

#[tokio::test]
async fn test_coingecko_retries_429_three_times_then_fails() {
    let mut config = SystemConfig::default().coingecko;
    config.rate_limit_delays_ms = vec![1, 1, 1];
    let base = config.api_base_url.clone();
    let http = Arc::new(MockFetcher::new().with_response(&format!("{}/coins/", base), 429, ""));
    let client = CoinGeckoClient::new(config, http.clone());

    let err = client.get_coin("bitcoin").await.unwrap_err();
    assert!(err.is_rate_limited());
    // initial attempt plus one retry per configured delay
    assert_eq!(http.calls_to(&format!("{}/coins/bitcoin", base)), 4);
}

#[tokio::test]
async fn test_coingecko_recovers_after_rate_limit() {
    let mut config = SystemConfig::default().coingecko;
    config.rate_limit_delays_ms = vec![1, 1, 1];
    let base = config.api_base_url.clone();
    let coin = json!({
        "id": "ethereum",
        "symbol": "eth",
        "name": "Ethereum",
        "market_data": {
            "current_price": {"usd": 3000.0},
            "market_cap": {"usd": 360_000_000_000u64},
            "total_volume": {"usd": 15_000_000_000u64},
            "price_change_percentage_24h": 1.5,
            "price_change_percentage_7d": -3.2
        }
    });
    let http = Arc::new(MockFetcher::new().with_sequence(
        &format!("{}/coins/", base),
        vec![
            MockReply::Respond(HttpResponse::new(429, "")),
            MockReply::Respond(HttpResponse::new(200, coin.to_string())),
        ],
    ));
    let client = CoinGeckoClient::new(config, http.clone());

    let id = client.resolve_id("$ETH").await.unwrap().unwrap();
    assert_eq!(id, "ethereum");
    let snapshot = client.get_coin(&id).await.unwrap().unwrap();
    assert_eq!(snapshot.symbol, "eth");
    assert_eq!(snapshot.price_usd, Some(3000.0));
    assert_eq!(snapshot.change_7d_pct, Some(-3.2));
    assert_eq!(http.call_count(), 2);
}

#[tokio::test]
async fn test_coingecko_resolves_from_coin_list_once() {
    let config = SystemConfig::default().coingecko;
    let base = config.api_base_url.clone();
    let http = Arc::new(MockFetcher::new().with_json(
        &format!("{}/coins/list", base),
        json!([
            {"id": "pepe", "symbol": "pepe", "name": "Pepe"},
            {"id": "wrapped-bitcoin", "symbol": "wbtc", "name": "Wrapped Bitcoin"}
        ]),
    ));
    let client = CoinGeckoClient::new(config, http.clone());

    assert_eq!(client.resolve_id("WBTC").await.unwrap().as_deref(), Some("wrapped-bitcoin"));
    assert_eq!(client.resolve_id("pepe").await.unwrap().as_deref(), Some("pepe"));
    assert_eq!(client.resolve_id("nosuchcoin").await.unwrap(), None);
    assert_eq!(http.calls_to(&format!("{}/coins/list", base)), 1);
}
