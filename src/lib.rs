//! CCXT-Runtime: shared runtime for CCXT-style exchange integrations
//!
//! 거래소 구현체들이 공유하는 런타임. A concrete exchange supplies an
//! [`ExchangeDefinition`]: its nested endpoint config, capability flags and
//! the operations it overrides. [`BaseExchange`] turns that into
//!
//! - a flat table of named, cost-weighted endpoints
//! - a dispatch surface where overrides shadow shared base operations
//! - single-flight market/currency loading with atomic publication
//! - a FIFO token-bucket throttle in front of the transport
//!
//! ```no_run
//! use std::sync::Arc;
//! use ccxt_runtime::{api_urls, BaseExchange, ExchangeConfig, HttpClient};
//! # use ccxt_runtime::types::ExchangeDefinition;
//! # struct Demo;
//! # impl ExchangeDefinition for Demo {
//! #     fn id(&self) -> &str { "demo" }
//! #     fn name(&self) -> &str { "Demo" }
//! #     fn api(&self) -> serde_json::Value {
//! #         serde_json::json!({ "public": { "get": ["markets", "time"] } })
//! #     }
//! # }
//!
//! # async fn run() -> ccxt_runtime::CcxtResult<()> {
//! let config = ExchangeConfig::new();
//! let http = HttpClient::new(api_urls! { "public" => "https://api.demo.com" }, &config)?;
//! let exchange = BaseExchange::new(Demo, config, Arc::new(http))?;
//!
//! let time = exchange.invoke("publicGetTime", vec![]).await?;
//! let markets = exchange.load_markets(false).await?;
//! # let _ = (time, markets);
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod client;
pub mod errors;
pub mod runtime;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

// Re-exports
pub use client::{EndpointRequest, ExchangeConfig, HttpClient, RateLimiter, RateLimiterStats, Transport};
pub use errors::{CcxtError, CcxtResult, ErrorKind};
pub use runtime::{BaseExchange, CancelToken, OperationContext, OperationTable};
pub use types::{ExchangeDefinition, LoadState, Market, MarketSnapshot};
