//! Runtime types
//!
//! 엔드포인트 디스크립터, 마켓/화폐 스냅샷, 거래소 정의

mod api;
mod currency;
mod exchange;
mod market;
mod snapshot;

pub use api::*;
pub use currency::*;
pub use exchange::*;
pub use market::*;
pub use snapshot::*;
