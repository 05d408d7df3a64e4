//! Integration tests for descriptor compilation
//!
//! Compiles a realistic exchange endpoint config and checks names, costs and
//! groups end to end, including URL construction by the HTTP transport

use std::sync::Arc;

use ccxt_runtime::runtime::compile_api;
use ccxt_runtime::testkit::MockTransport;
use ccxt_runtime::types::{ApiGroup, Capabilities, ExchangeDefinition, HttpMethod};
use ccxt_runtime::{api_urls, capabilities, BaseExchange, EndpointRequest, ExchangeConfig, HttpClient};
use serde_json::{json, Value};

struct CoinsLike;

impl ExchangeDefinition for CoinsLike {
    fn id(&self) -> &str {
        "coinslike"
    }

    fn name(&self) -> &str {
        "Coins Like"
    }

    fn rate_limit(&self) -> u64 {
        50
    }

    fn api(&self) -> Value {
        json!({
            "public": {
                "get": {
                    "openapi/v1/ping": 1,
                    "openapi/v1/time": 1,
                    "openapi/quote/v1/ticker/24hr": { "cost": 1, "noSymbolAndNoSymbols": 40 },
                    "openapi/v1/exchangeInfo": 10,
                    "openapi/quote/v1/depth": { "cost": 1, "byLimit": [[101, 5], [0, 1]] },
                },
            },
            "private": {
                "get": {
                    "openapi/v1/openOrders": { "cost": 3, "noSymbol": 40 },
                    "openapi/v1/order": 2,
                    "openapi/transfer/v3/transfers/{id}": 1,
                },
                "post": {
                    "openapi/wallet/v1/withdraw/apply": 600,
                    "openapi/v1/order": 1,
                },
                "delete": {
                    "openapi/v1/order": 1,
                },
            },
        })
    }

    fn has(&self) -> Capabilities {
        capabilities! {
            fetchMarkets,
            fetchTime,
            fetchStatus = Emulated,
        }
    }
}

/// 실제 거래소 형태의 설정 컴파일
#[test]
fn test_compile_exchange_config() {
    let table = compile_api(&CoinsLike.api()).unwrap();
    assert_eq!(table.len(), 11);

    let ticker = &table["publicGetOpenapiQuoteV1Ticker24hr"];
    assert_eq!(ticker.method, HttpMethod::Get);
    assert_eq!(ticker.path, "openapi/quote/v1/ticker/24hr");
    assert_eq!(ticker.cost, 1.0);

    assert_eq!(table["publicGetOpenapiV1ExchangeInfo"].cost, 10.0);
    assert_eq!(table["privateGetOpenapiV1OpenOrders"].cost, 3.0);
    assert_eq!(table["privatePostOpenapiWalletV1WithdrawApply"].cost, 600.0);

    // same path, different verbs
    assert_eq!(table["privateGetOpenapiV1Order"].cost, 2.0);
    assert_eq!(table["privatePostOpenapiV1Order"].method, HttpMethod::Post);
    assert_eq!(table["privateDeleteOpenapiV1Order"].method, HttpMethod::Delete);

    let transfer = &table["privateGetOpenapiTransferV3TransfersId"];
    assert_eq!(transfer.api, ApiGroup::Single("private".into()));
}

/// 런타임 생성 시 한 번 컴파일되고 메타데이터가 반영됨
#[test]
fn test_runtime_uses_definition_metadata() {
    let exchange =
        BaseExchange::new(CoinsLike, ExchangeConfig::new(), Arc::new(MockTransport::new())).unwrap();

    assert_eq!(exchange.name(), "Coins Like");
    assert_eq!(exchange.version(), "v1");
    assert_eq!(exchange.api().len(), 11);
    assert!(exchange.has("fetchStatus"));
    assert!(!exchange.has("fetchCurrencies"));
    // 50 ms per token
    assert_eq!(exchange.rate_limiter().refill_rate(), 20.0);
}

/// 설정의 rate limit가 거래소 기본값보다 우선
#[test]
fn test_config_rate_limit_overrides_definition() {
    let config = ExchangeConfig::new().with_rate_limit_ms(200).with_throttle_capacity(5.0);
    let exchange = BaseExchange::new(CoinsLike, config, Arc::new(MockTransport::new())).unwrap();

    assert_eq!(exchange.rate_limiter().refill_rate(), 5.0);
    assert_eq!(exchange.rate_limiter().capacity(), 5.0);
}

/// 컴파일된 디스크립터로 HTTP URL 생성
#[test]
fn test_http_url_from_descriptor() {
    let table = compile_api(&CoinsLike.api()).unwrap();
    let descriptor = table["privateGetOpenapiTransferV3TransfersId"].clone();
    let client = HttpClient::new(
        api_urls! {
            "public" => "https://api.pro.coins.ph",
            "private" => "https://api.pro.coins.ph/",
        },
        &ExchangeConfig::new(),
    )
    .unwrap();

    let request = EndpointRequest {
        name: "privateGetOpenapiTransferV3TransfersId".into(),
        method: descriptor.method,
        path: descriptor.path,
        api: descriptor.api,
        params: json!({ "id": "t-1", "recvWindow": 5000 }),
        cost: descriptor.cost,
    };
    let (url, rest) = client.build_url(&request).unwrap();

    assert_eq!(url, "https://api.pro.coins.ph/openapi/transfer/v3/transfers/t-1");
    assert_eq!(rest.len(), 1);
    assert_eq!(rest["recvWindow"], json!(5000));
}
