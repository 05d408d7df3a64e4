//! Exchange runtime
//!
//! - [`descriptor`]: endpoint descriptor compiler
//! - [`dispatch`]: named operation resolution with per-exchange overrides
//! - [`loader`]: single-flight market/currency loading
//! - [`exchange`]: the runtime instance tying them to a transport

mod cancel;
pub mod descriptor;
pub mod dispatch;
mod exchange;
pub mod loader;
mod task;

pub use cancel::CancelToken;
pub use descriptor::{compile_api, operation_name};
pub use dispatch::{
    base_operations, MethodInfo, MethodSource, Operation, OperationArgs, OperationContext,
    OperationTable,
};
pub use exchange::BaseExchange;
pub use loader::{LoadOutcome, MarketLoader, PublishedMarkets};
pub use task::{spawn_task, TaskHandle};
