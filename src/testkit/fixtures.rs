//! Canonical descriptor configs and market payloads used across tests.

use serde_json::{json, Value};

/// Descriptor config with nested, single-label and list-form groups
pub fn sample_api() -> Value {
    json!({
        "v2": {
            "public": {
                "get": {
                    "time": {},
                    "currencies": { "cost": 2 },
                },
            },
        },
        "public": {
            "get": ["markets", "orderbook/{symbol}"],
        },
        "private": {
            "post": { "orders": 5, "orders/{id}/cancel": "0.5" },
            "delete": { "orders/{id}": {} },
        },
    })
}

/// `fetchMarkets` payload: a spot and a swap market sharing one id, plus ETH
pub fn sample_markets() -> Value {
    json!([
        { "id": "BTCUSDT", "symbol": "BTC/USDT", "base": "BTC", "quote": "USDT",
          "baseId": "BTC", "quoteId": "USDT", "type": "spot", "spot": true },
        { "id": "BTCUSDT", "symbol": "BTC/USDT:USDT", "base": "BTC", "quote": "USDT",
          "settle": "USDT", "type": "swap", "swap": true, "contract": true },
        { "id": "ETHUSDT", "symbol": "ETH/USDT", "base": "ETH", "quote": "USDT",
          "type": "spot", "spot": true },
    ])
}

/// `fetchCurrencies` payload keyed by code
pub fn sample_currencies() -> Value {
    json!({
        "BTC": { "id": "XBT", "code": "BTC", "name": "Bitcoin" },
        "ETH": { "id": "ETH", "code": "ETH", "name": "Ether" },
        "USDT": { "id": "USDT", "code": "USDT", "name": "Tether" },
    })
}
