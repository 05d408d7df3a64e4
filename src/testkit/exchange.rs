//! [`ScriptedExchange`]: an exchange definition for tests.
//!
//! Market and currency fetches are scripted the same way as
//! [`MockTransport`](super::MockTransport) responses: results are popped in
//! order and the last one repeats. Shared counters record how often each
//! fetch actually ran.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::errors::CcxtResult;
use crate::runtime::{OperationArgs, OperationContext, OperationTable};
use crate::types::{Capabilities, Capability, ExchangeDefinition};

type Script = Arc<Mutex<VecDeque<CcxtResult<Value>>>>;

pub struct ScriptedExchange {
    id: String,
    api: Value,
    has: Capabilities,
    rate_limit: u64,
    operations: OperationTable,
    fetch_delay: Duration,
    market_fetches: Arc<AtomicUsize>,
    currency_fetches: Arc<AtomicUsize>,
    operations_calls: Arc<AtomicUsize>,
}

impl ScriptedExchange {
    /// Empty api, no capabilities, 1 ms rate limit
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            api: json!({}),
            has: Capabilities::new(),
            rate_limit: 1,
            operations: OperationTable::new(),
            fetch_delay: Duration::ZERO,
            market_fetches: Arc::new(AtomicUsize::new(0)),
            currency_fetches: Arc::new(AtomicUsize::new(0)),
            operations_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_api(mut self, api: Value) -> Self {
        self.api = api;
        self
    }

    pub fn with_capability(mut self, name: &str, capability: Capability) -> Self {
        self.has.set(name, capability);
        self
    }

    pub fn with_rate_limit(mut self, rate_limit_ms: u64) -> Self {
        self.rate_limit = rate_limit_ms;
        self
    }

    /// Delay every scripted market/currency fetch by `delay`. Set it before
    /// scripting the fetches.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Override (or add) an operation
    pub fn with_operation<F, Fut>(mut self, name: &str, arity: usize, handler: F) -> Self
    where
        F: Fn(OperationContext, OperationArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CcxtResult<Value>> + Send + 'static,
    {
        self.operations.register(name, arity, handler);
        self
    }

    /// `fetchMarkets` answers `markets`
    pub fn with_markets(self, markets: Value) -> Self {
        self.with_market_results(vec![Ok(markets)])
    }

    /// `fetchMarkets` answers `results` in order, repeating the last one
    pub fn with_market_results(mut self, results: Vec<CcxtResult<Value>>) -> Self {
        let script = Arc::new(Mutex::new(results.into()));
        let counter = self.market_fetches.clone();
        self.operations
            .register("fetchMarkets", 1, scripted(script, counter, self.fetch_delay));
        self
    }

    /// `fetchCurrencies` answers `currencies`; also flags the capability
    pub fn with_currencies(self, currencies: Value) -> Self {
        self.with_currency_results(vec![Ok(currencies)])
    }

    pub fn with_currency_results(mut self, results: Vec<CcxtResult<Value>>) -> Self {
        let script = Arc::new(Mutex::new(results.into()));
        let counter = self.currency_fetches.clone();
        self.operations
            .register("fetchCurrencies", 1, scripted(script, counter, self.fetch_delay));
        self.has.set("fetchCurrencies", Capability::Supported);
        self
    }

    /// Get a shared counter of `fetchMarkets` runs.
    pub fn market_fetches(&self) -> Arc<AtomicUsize> {
        self.market_fetches.clone()
    }

    /// Get a shared counter of `fetchCurrencies` runs.
    pub fn currency_fetches(&self) -> Arc<AtomicUsize> {
        self.currency_fetches.clone()
    }

    /// Get a shared counter of how often the runtime asked for the
    /// operation table.
    pub fn operations_calls(&self) -> Arc<AtomicUsize> {
        self.operations_calls.clone()
    }
}

fn scripted(
    script: Script,
    counter: Arc<AtomicUsize>,
    delay: Duration,
) -> impl Fn(OperationContext, OperationArgs) -> std::pin::Pin<Box<dyn Future<Output = CcxtResult<Value>> + Send>>
       + Send
       + Sync
       + 'static {
    move |_ctx, _args| {
        let script = script.clone();
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let mut script = script.lock();
            if script.len() > 1 {
                script.pop_front().unwrap_or_else(|| Ok(Value::Null))
            } else {
                script.front().cloned().unwrap_or_else(|| Ok(Value::Null))
            }
        })
    }
}

impl ExchangeDefinition for ScriptedExchange {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn rate_limit(&self) -> u64 {
        self.rate_limit
    }

    fn api(&self) -> Value {
        self.api.clone()
    }

    fn has(&self) -> Capabilities {
        self.has.clone()
    }

    fn operations(&self) -> OperationTable {
        self.operations_calls.fetch_add(1, Ordering::SeqCst);
        self.operations.clone()
    }
}
