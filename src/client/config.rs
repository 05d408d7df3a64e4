//! Exchange configuration

use serde::Deserialize;

use crate::types::Market;

/// 거래소 설정
///
/// Every field has a default, so a partial JSON document deserializes:
///
/// ```
/// # use ccxt_runtime::ExchangeConfig;
/// let config: ExchangeConfig =
///     serde_json::from_str(r#"{ "rateLimitMs": 50, "enableRateLimit": false }"#).unwrap();
/// assert_eq!(config.rate_limit_ms(), Some(50));
/// assert!(!config.enable_rate_limit());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExchangeConfig {
    timeout_ms: u64,
    rate_limit_ms: Option<u64>,
    enable_rate_limit: bool,
    throttle_capacity: f64,
    load_timeout_ms: Option<u64>,
    hostname: Option<String>,
    markets: Option<Vec<Market>>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            rate_limit_ms: None,
            enable_rate_limit: true,
            throttle_capacity: 1.0,
            load_timeout_ms: None,
            hostname: None,
            markets: None,
        }
    }
}

impl ExchangeConfig {
    /// 기본 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 타임아웃 설정 (밀리초)
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// 레이트 리밋 설정 (밀리초). Overrides the exchange's own rate limit
    pub fn with_rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.rate_limit_ms = Some(rate_limit_ms);
        self
    }

    /// 레이트 리밋 사용 여부
    pub fn with_enable_rate_limit(mut self, enabled: bool) -> Self {
        self.enable_rate_limit = enabled;
        self
    }

    /// 토큰 버킷 용량
    pub fn with_throttle_capacity(mut self, capacity: f64) -> Self {
        self.throttle_capacity = capacity;
        self
    }

    /// Upper bound for a caller waiting on a market load
    pub fn with_load_timeout(mut self, load_timeout_ms: u64) -> Self {
        self.load_timeout_ms = Some(load_timeout_ms);
        self
    }

    /// 호스트네임 설정
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Markets published at construction, before any load
    pub fn with_markets(mut self, markets: Vec<Market>) -> Self {
        self.markets = Some(markets);
        self
    }

    // === Getters ===

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn rate_limit_ms(&self) -> Option<u64> {
        self.rate_limit_ms
    }

    pub fn enable_rate_limit(&self) -> bool {
        self.enable_rate_limit
    }

    pub fn throttle_capacity(&self) -> f64 {
        self.throttle_capacity
    }

    pub fn load_timeout_ms(&self) -> Option<u64> {
        self.load_timeout_ms
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn markets(&self) -> Option<&[Market]> {
        self.markets.as_deref()
    }
}
