//! Currency type - 화폐 정보

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MinMax;

/// 화폐 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    /// 화폐 ID (거래소 내부)
    pub id: String,
    /// 통합 코드 (예: 'BTC')
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdraw: Option<bool>,
    /// 출금 수수료
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<Decimal>,
    #[serde(default)]
    pub limits: CurrencyLimits,
    /// 원본 응답
    #[serde(default)]
    pub info: serde_json::Value,
}

fn default_active() -> bool {
    true
}

/// 화폐 제한
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyLimits {
    #[serde(default)]
    pub withdraw: MinMax,
    #[serde(default)]
    pub deposit: MinMax,
}

impl Currency {
    /// 새 Currency 생성
    pub fn new(id: &str, code: &str) -> Self {
        Self {
            id: id.to_string(),
            code: code.to_string(),
            name: None,
            active: true,
            deposit: None,
            withdraw: None,
            fee: None,
            precision: None,
            limits: CurrencyLimits::default(),
            info: serde_json::Value::Null,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_fee(mut self, fee: Decimal) -> Self {
        self.fee = Some(fee);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency() {
        let currency = Currency::new("XBT", "BTC")
            .with_name("Bitcoin")
            .with_fee(dec!(0.0005));

        assert_eq!(currency.id, "XBT");
        assert_eq!(currency.code, "BTC");
        assert_eq!(currency.name, Some("Bitcoin".into()));
        assert_eq!(currency.fee, Some(dec!(0.0005)));
    }
}
