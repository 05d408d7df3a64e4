//! Market and currency snapshots
//!
//! Snapshots are immutable once built and are published behind `Arc`s, so a
//! reader holding a snapshot keeps a consistent (possibly stale) view while a
//! newer one is published.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::{Currency, Market};
use crate::errors::{CcxtError, CcxtResult};

/// 심볼 -> 마켓
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    markets: BTreeMap<String, Market>,
}

impl MarketSnapshot {
    /// Builds a snapshot keyed by symbol; a later market with the same symbol
    /// replaces the earlier one.
    pub fn from_markets(markets: impl IntoIterator<Item = Market>) -> Self {
        let markets = markets
            .into_iter()
            .map(|market| (market.symbol.clone(), market))
            .collect();
        Self { markets }
    }

    /// Accepts either a list of markets or a mapping of symbol -> market
    pub fn from_value(value: Value) -> CcxtResult<Self> {
        let markets: Vec<Market> = match value {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<_, _>>()
                .map_err(|e| bad_response("markets", e))?,
            Value::Object(map) => map
                .into_iter()
                .map(|(_, item)| serde_json::from_value(item))
                .collect::<Result<_, _>>()
                .map_err(|e| bad_response("markets", e))?,
            Value::Null => Vec::new(),
            other => {
                return Err(CcxtError::BadResponse {
                    message: format!("markets: expected a list or mapping, got {other}"),
                })
            }
        };
        Ok(Self::from_markets(markets))
    }

    pub fn get(&self, symbol: &str) -> Option<&Market> {
        self.markets.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.markets.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Markets in symbol order
    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(
            self.markets
                .values()
                .filter_map(|market| serde_json::to_value(market).ok())
                .collect(),
        )
    }
}

/// 코드 -> 화폐
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencySnapshot {
    currencies: BTreeMap<String, Currency>,
}

impl CurrencySnapshot {
    pub fn from_currencies(currencies: impl IntoIterator<Item = Currency>) -> Self {
        let currencies = currencies
            .into_iter()
            .map(|currency| (currency.code.clone(), currency))
            .collect();
        Self { currencies }
    }

    /// Accepts either a list of currencies or a mapping of code -> currency
    pub fn from_value(value: Value) -> CcxtResult<Self> {
        let currencies: Vec<Currency> = match value {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<_, _>>()
                .map_err(|e| bad_response("currencies", e))?,
            Value::Object(map) => map
                .into_iter()
                .map(|(_, item)| serde_json::from_value(item))
                .collect::<Result<_, _>>()
                .map_err(|e| bad_response("currencies", e))?,
            Value::Null => Vec::new(),
            other => {
                return Err(CcxtError::BadResponse {
                    message: format!("currencies: expected a list or mapping, got {other}"),
                })
            }
        };
        Ok(Self::from_currencies(currencies))
    }

    pub fn get(&self, code: &str) -> Option<&Currency> {
        self.currencies.get(code)
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.values()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.currencies
                .iter()
                .filter_map(|(code, currency)| {
                    serde_json::to_value(currency)
                        .ok()
                        .map(|value| (code.clone(), value))
                })
                .collect(),
        )
    }
}

fn bad_response(what: &str, err: serde_json::Error) -> CcxtError {
    CcxtError::BadResponse {
        message: format!("{what}: {err}"),
    }
}

/// Indices derived from a market snapshot
///
/// Built in one pass and published together with the snapshot it was derived
/// from.
#[derive(Debug, Clone, Default)]
pub struct MarketIndex {
    /// 거래소 ID -> 마켓 목록 (spot/swap이 같은 ID를 공유할 수 있음)
    pub markets_by_id: HashMap<String, Vec<Market>>,
    /// 정렬된 심볼 목록
    pub symbols: Vec<String>,
    /// 정렬된 ID 목록
    pub ids: Vec<String>,
    /// Fetched currencies, or currencies derived from market base/quote codes
    pub currencies: Arc<CurrencySnapshot>,
    pub currencies_by_id: HashMap<String, Currency>,
    /// 정렬된 화폐 코드 목록
    pub codes: Vec<String>,
}

impl MarketIndex {
    pub fn build(markets: &MarketSnapshot, currencies: Option<&Arc<CurrencySnapshot>>) -> Self {
        let mut markets_by_id: HashMap<String, Vec<Market>> = HashMap::new();
        let mut ids = BTreeSet::new();
        for market in markets.iter() {
            ids.insert(market.id.clone());
            markets_by_id
                .entry(market.id.clone())
                .or_default()
                .push(market.clone());
        }

        let currencies = match currencies {
            Some(fetched) if !fetched.is_empty() => Arc::clone(fetched),
            _ => Arc::new(derive_currencies(markets)),
        };
        let currencies_by_id = currencies
            .iter()
            .map(|currency| (currency.id.clone(), currency.clone()))
            .collect();
        let codes = currencies.iter().map(|c| c.code.clone()).collect();

        Self {
            markets_by_id,
            symbols: markets.iter().map(|m| m.symbol.clone()).collect(),
            ids: ids.into_iter().collect(),
            currencies,
            currencies_by_id,
            codes,
        }
    }
}

/// Base and quote (and settle) codes of every market become currency entries
fn derive_currencies(markets: &MarketSnapshot) -> CurrencySnapshot {
    let mut derived: BTreeMap<String, Currency> = BTreeMap::new();
    for market in markets.iter() {
        let pairs = [
            (market.base_id.as_str(), market.base.as_str()),
            (market.quote_id.as_str(), market.quote.as_str()),
        ];
        for (id, code) in pairs {
            if code.is_empty() {
                continue;
            }
            let id = if id.is_empty() { code } else { id };
            derived
                .entry(code.to_string())
                .or_insert_with(|| Currency::new(id, code));
        }
        if let Some(settle) = &market.settle {
            derived
                .entry(settle.clone())
                .or_insert_with(|| Currency::new(settle, settle));
        }
    }
    CurrencySnapshot::from_currencies(derived.into_values())
}
