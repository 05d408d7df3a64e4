//! Exchange definition - 거래소 구현체가 제공하는 정적 정보와 오버라이드
//!
//! A concrete exchange is a value implementing [`ExchangeDefinition`]: static
//! metadata, the nested endpoint descriptor config, capability flags and the
//! table of operations it overrides. Everything it does not override is served
//! by the shared base operations of the runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::runtime::OperationTable;

/// 기능 지원 수준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Supported,
    /// Provided by the runtime on top of other operations
    Emulated,
    Unsupported,
}

impl Capability {
    pub fn is_available(&self) -> bool {
        !matches!(self, Capability::Unsupported)
    }
}

/// Capability name (camelCase, e.g. `fetchCurrencies`) -> support level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    flags: BTreeMap<String, Capability>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, capability: Capability) {
        self.flags.insert(name.into(), capability);
    }

    pub fn with(mut self, name: impl Into<String>, capability: Capability) -> Self {
        self.set(name, capability);
        self
    }

    /// 특정 기능 지원 여부 (emulated 포함)
    pub fn has(&self, name: &str) -> bool {
        self.flags
            .get(name)
            .map(Capability::is_available)
            .unwrap_or(false)
    }

    pub fn get(&self, name: &str) -> Option<Capability> {
        self.flags.get(name).copied()
    }

    /// Reads a CCXT-style `has` mapping: `true`, `false` or `"emulated"`.
    /// Any other value counts as unsupported.
    pub fn from_value(value: &Value) -> Self {
        let mut capabilities = Self::new();
        if let Value::Object(map) = value {
            for (name, flag) in map {
                let capability = match flag {
                    Value::Bool(true) => Capability::Supported,
                    Value::String(s) if s.eq_ignore_ascii_case("emulated") => Capability::Emulated,
                    _ => Capability::Unsupported,
                };
                capabilities.set(name.clone(), capability);
            }
        }
        capabilities
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Capability)> {
        self.flags.iter().map(|(name, cap)| (name.as_str(), *cap))
    }
}

/// 마켓 로드 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
}

/// 거래소 구현체 인터페이스
///
/// The runtime reads the descriptor config and capabilities once, at
/// construction, and calls [`operations`](Self::operations) once, during the
/// dispatch warm-up.
pub trait ExchangeDefinition: Send + Sync + 'static {
    /// 거래소 ID (예: 'upbit')
    fn id(&self) -> &str;

    /// 거래소 이름
    fn name(&self) -> &str;

    /// API 버전
    fn version(&self) -> &str {
        "v1"
    }

    /// 레이트 리밋 (밀리초), used unless the config overrides it
    fn rate_limit(&self) -> u64 {
        1000
    }

    /// Nested endpoint descriptor config (`api` in CCXT terms)
    fn api(&self) -> Value;

    /// 지원 기능
    fn has(&self) -> Capabilities {
        Capabilities::new()
    }

    /// Operations this exchange overrides or adds
    fn operations(&self) -> OperationTable {
        OperationTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capabilities_from_value() {
        let has = Capabilities::from_value(&json!({
            "fetchCurrencies": true,
            "fetchTime": "emulated",
            "fetchTicker": false,
            "ws": null
        }));

        assert!(has.has("fetchCurrencies"));
        assert!(has.has("fetchTime"));
        assert_eq!(has.get("fetchTime"), Some(Capability::Emulated));
        assert!(!has.has("fetchTicker"));
        assert!(!has.has("ws"));
        assert!(!has.has("fetchOHLCV"));
    }

    #[test]
    fn test_load_state_default() {
        assert_eq!(LoadState::default(), LoadState::Idle);
    }
}
