//! Market type - 거래소 마켓 정보

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 마켓 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    #[default]
    Spot,
    Margin,
    Swap,
    Future,
    Option,
}

/// 마켓 정보
///
/// Only `id`, `symbol`, `base` and `quote` are required when deserializing a
/// market-fetch result; everything else falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    /// 거래소 내부 ID (예: 'KRW-BTC')
    pub id: String,
    /// 통합 심볼 (예: 'BTC/KRW')
    pub symbol: String,
    /// 기준 화폐 (예: 'BTC')
    pub base: String,
    /// 견적 화폐 (예: 'KRW')
    pub quote: String,
    /// 정산 화폐 (파생상품용)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle: Option<String>,
    /// 거래소 기준 화폐 ID
    #[serde(default)]
    pub base_id: String,
    /// 거래소 견적 화폐 ID
    #[serde(default)]
    pub quote_id: String,
    /// 마켓 타입
    #[serde(rename = "type", default)]
    pub market_type: MarketType,
    #[serde(default)]
    pub spot: bool,
    #[serde(default)]
    pub margin: bool,
    #[serde(default)]
    pub swap: bool,
    #[serde(default)]
    pub future: bool,
    #[serde(default)]
    pub option: bool,
    #[serde(default)]
    pub contract: bool,
    /// 활성 상태
    #[serde(default = "default_active")]
    pub active: bool,
    /// 테이커 수수료
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taker: Option<Decimal>,
    /// 메이커 수수료
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maker: Option<Decimal>,
    /// 계약 크기
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_size: Option<Decimal>,
    /// 정밀도
    #[serde(default)]
    pub precision: MarketPrecision,
    /// 거래 제한
    #[serde(default)]
    pub limits: MarketLimits,
    /// 원본 응답
    #[serde(default)]
    pub info: serde_json::Value,
}

fn default_active() -> bool {
    true
}

/// 마켓 정밀도 (tick size)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketPrecision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
}

/// 마켓 제한
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketLimits {
    #[serde(default)]
    pub amount: MinMax,
    #[serde(default)]
    pub price: MinMax,
    #[serde(default)]
    pub cost: MinMax,
    #[serde(default)]
    pub leverage: MinMax,
}

/// 최소/최대 값
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
}

impl Market {
    /// 현물 마켓 생성
    pub fn spot(id: &str, base: &str, quote: &str) -> Self {
        Self {
            id: id.to_string(),
            symbol: format!("{base}/{quote}"),
            base: base.to_string(),
            quote: quote.to_string(),
            settle: None,
            base_id: base.to_string(),
            quote_id: quote.to_string(),
            market_type: MarketType::Spot,
            spot: true,
            margin: false,
            swap: false,
            future: false,
            option: false,
            contract: false,
            active: true,
            taker: None,
            maker: None,
            contract_size: None,
            precision: MarketPrecision::default(),
            limits: MarketLimits::default(),
            info: serde_json::Value::Null,
        }
    }

    /// 수수료 설정
    pub fn with_fees(mut self, maker: Decimal, taker: Decimal) -> Self {
        self.maker = Some(maker);
        self.taker = Some(taker);
        self
    }

    /// 정밀도 설정
    pub fn with_precision(mut self, amount: Decimal, price: Decimal) -> Self {
        self.precision.amount = Some(amount);
        self.precision.price = Some(price);
        self
    }
}
