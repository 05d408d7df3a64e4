//! Runtime instance of a concrete exchange
//!
//! [`BaseExchange`] owns everything shared by the operations of one exchange:
//! the compiled endpoint table, the dispatch cache, the throttle, the market
//! loader and the transport. It is always handled through an `Arc` because
//! every operation runs on its own task.

use serde_json::{json, Map, Value};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::descriptor::compile_api;
use super::dispatch::{Dispatcher, MethodInfo, OperationArgs};
use super::loader::{LoadDecision, LoadOutcome, MarketLoader};
use super::task::spawn_task;
use super::CancelToken;
use crate::client::{EndpointRequest, ExchangeConfig, RateLimiter, Transport};
use crate::errors::{CcxtError, CcxtResult};
use crate::types::{
    ApiTable, Capabilities, Currency, CurrencySnapshot, EndpointDescriptor, ExchangeDefinition,
    LoadState, Market, MarketSnapshot,
};

/// 거래소 런타임
pub struct BaseExchange {
    id: String,
    name: String,
    version: String,
    config: ExchangeConfig,
    capabilities: Capabilities,
    api: Arc<ApiTable>,
    dispatcher: Dispatcher,
    rate_limiter: RateLimiter,
    transport: Arc<dyn Transport>,
    loader: MarketLoader,
    shutdown: CancelToken,
}

impl BaseExchange {
    /// Builds the runtime for `definition`; the endpoint config is compiled
    /// here, once.
    pub fn new<D: ExchangeDefinition>(
        definition: D,
        config: ExchangeConfig,
        transport: Arc<dyn Transport>,
    ) -> CcxtResult<Arc<Self>> {
        Self::from_definition(Arc::new(definition), config, transport)
    }

    pub fn from_definition(
        definition: Arc<dyn ExchangeDefinition>,
        config: ExchangeConfig,
        transport: Arc<dyn Transport>,
    ) -> CcxtResult<Arc<Self>> {
        let api = Arc::new(compile_api(&definition.api())?);
        let rate_limit_ms = config
            .rate_limit_ms()
            .unwrap_or_else(|| definition.rate_limit());
        let rate_limiter = RateLimiter::with_capacity(rate_limit_ms, config.throttle_capacity());
        let loader = match config.markets() {
            Some(markets) => {
                MarketLoader::preloaded(MarketSnapshot::from_markets(markets.iter().cloned()))
            }
            None => MarketLoader::new(),
        };

        info!(
            exchange = definition.id(),
            endpoints = api.len(),
            rate_limit_ms,
            "exchange initialized"
        );

        Ok(Arc::new(Self {
            id: definition.id().to_string(),
            name: definition.name().to_string(),
            version: definition.version().to_string(),
            capabilities: definition.has(),
            dispatcher: Dispatcher::new(Arc::clone(&definition), Arc::clone(&api)),
            api,
            config,
            rate_limiter,
            transport,
            loader,
            shutdown: CancelToken::new(),
        }))
    }

    // === Metadata ===

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// 특정 기능 지원 여부
    pub fn has(&self, capability: &str) -> bool {
        self.capabilities.has(capability)
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// 컴파일된 엔드포인트 테이블
    pub fn api(&self) -> &ApiTable {
        &self.api
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.api.get(name)
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    // === Dispatch ===

    /// Resolves a method name against overrides, base operations and endpoints
    pub fn resolve(&self, name: &str) -> Option<MethodInfo> {
        self.dispatcher.resolve(name)
    }

    pub fn method_names(&self) -> Vec<String> {
        self.dispatcher.method_names()
    }

    pub fn warm_up_count(&self) -> usize {
        self.dispatcher.warm_up_count()
    }

    /// 이름으로 오퍼레이션 호출
    pub async fn invoke(self: &Arc<Self>, name: &str, args: OperationArgs) -> CcxtResult<Value> {
        self.invoke_with(name, args, &self.shutdown).await
    }

    /// Like [`invoke`](Self::invoke), but the caller can stop waiting through
    /// `cancel`. The token is also handed to the operation itself.
    pub async fn invoke_with(
        self: &Arc<Self>,
        name: &str,
        args: OperationArgs,
        cancel: &CancelToken,
    ) -> CcxtResult<Value> {
        self.ensure_open(name)?;
        let handle = self
            .dispatcher
            .spawn(Arc::clone(self), name, args, cancel.clone())?;
        tokio::select! {
            result = handle.join_with(cancel) => result,
            _ = self.shutdown.cancelled() => Err(CcxtError::cancelled(name)),
        }
    }

    // === Endpoints ===

    /// 엔드포인트 호출
    pub async fn call_endpoint(self: &Arc<Self>, name: &str, params: Value) -> CcxtResult<Value> {
        self.call_endpoint_with(name, params, &self.shutdown).await
    }

    pub async fn call_endpoint_with(
        self: &Arc<Self>,
        name: &str,
        params: Value,
        cancel: &CancelToken,
    ) -> CcxtResult<Value> {
        self.ensure_open(name)?;
        if !self.api.contains_key(name) {
            return Err(CcxtError::UnknownOperation {
                name: name.to_string(),
            });
        }

        let exchange = Arc::clone(self);
        let operation = name.to_string();
        let task_cancel = cancel.clone();
        let handle = spawn_task(name, async move {
            exchange
                .execute_endpoint(&operation, params, &task_cancel)
                .await
        });
        tokio::select! {
            result = handle.join_with(cancel) => result,
            _ = self.shutdown.cancelled() => Err(CcxtError::cancelled(name)),
        }
    }

    /// Throttle by the endpoint's cost, then hand the request to the
    /// transport under the configured timeout.
    pub(crate) async fn execute_endpoint(
        &self,
        name: &str,
        params: Value,
        cancel: &CancelToken,
    ) -> CcxtResult<Value> {
        let descriptor = self
            .api
            .get(name)
            .cloned()
            .ok_or_else(|| CcxtError::UnknownOperation {
                name: name.to_string(),
            })?;

        if self.config.enable_rate_limit() {
            tokio::select! {
                admitted = self.rate_limiter.throttle_with(descriptor.cost, cancel) => {
                    admitted.map_err(|_| CcxtError::cancelled(name))?
                }
                _ = self.shutdown.cancelled() => return Err(CcxtError::cancelled(name)),
            }
        }

        let params = match params {
            Value::Null => Value::Object(Map::new()),
            params => params,
        };
        let target = format!("{} {}", descriptor.method, descriptor.path);
        let request = EndpointRequest {
            name: name.to_string(),
            method: descriptor.method,
            path: descriptor.path,
            api: descriptor.api,
            params,
            cost: descriptor.cost,
        };
        debug!(exchange = %self.id, operation = name, %target, "calling endpoint");

        let timeout = Duration::from_millis(self.config.timeout_ms());
        tokio::select! {
            response = tokio::time::timeout(timeout, self.transport.execute(request)) => {
                response.unwrap_or_else(|_| Err(CcxtError::RequestTimeout { url: target }))
            }
            _ = cancel.cancelled() => Err(CcxtError::cancelled(name)),
            _ = self.shutdown.cancelled() => Err(CcxtError::cancelled(name)),
        }
    }

    // === Markets ===

    /// 마켓 로드
    ///
    /// Concurrent calls share a single load cycle. With `reload == false`
    /// already published markets are returned without touching the network.
    pub async fn load_markets(self: &Arc<Self>, reload: bool) -> CcxtResult<Arc<MarketSnapshot>> {
        self.load_markets_with(reload, &self.shutdown).await
    }

    /// Like [`load_markets`](Self::load_markets), but the caller can stop
    /// waiting through `cancel`. Cancelling a wait never cancels the shared
    /// load cycle.
    pub async fn load_markets_with(
        self: &Arc<Self>,
        reload: bool,
        cancel: &CancelToken,
    ) -> CcxtResult<Arc<MarketSnapshot>> {
        self.ensure_open("loadMarkets")?;
        let rx = match self.loader.begin(reload) {
            LoadDecision::Ready(markets) => return Ok(markets),
            LoadDecision::Subscribed(rx) => rx,
            LoadDecision::Start(rx) => {
                self.spawn_load_cycle();
                rx
            }
        };

        let limit = self.config.load_timeout_ms().map(Duration::from_millis);
        tokio::select! {
            outcome = rx => outcome.unwrap_or_else(|_| {
                Err(CcxtError::load(CcxtError::TaskFailed {
                    message: "market load ended without an outcome".into(),
                }))
            }),
            _ = deadline(limit) => Err(CcxtError::RequestTimeout { url: "loadMarkets".into() }),
            _ = cancel.cancelled() => Err(CcxtError::cancelled("loadMarkets")),
            _ = self.shutdown.cancelled() => Err(CcxtError::cancelled("loadMarkets")),
        }
    }

    fn spawn_load_cycle(self: &Arc<Self>) {
        let exchange = Arc::clone(self);
        tokio::spawn(async move {
            let cycle = {
                let exchange = Arc::clone(&exchange);
                spawn_task("loadMarkets", async move { exchange.load_cycle().await })
            };
            let outcome = cycle.join().await.map_err(CcxtError::load);
            exchange.loader.finish(outcome);
        });
    }

    /// currencies (when supported) -> markets -> index -> publish
    async fn load_cycle(self: Arc<Self>) -> LoadOutcome {
        let cancel = self.shutdown.clone();
        info!(exchange = %self.id, "loading markets");

        let currencies = if self.has("fetchCurrencies") {
            let value = self
                .invoke_with("fetchCurrencies", vec![json!({})], &cancel)
                .await?;
            let currencies = Arc::new(CurrencySnapshot::from_value(value)?);
            self.loader.stage_currencies(Some(Arc::clone(&currencies)));
            Some(currencies)
        } else {
            None
        };

        let fetched = self
            .invoke_with("fetchMarkets", vec![json!({})], &cancel)
            .await;
        self.loader.stage_currencies(None);

        let markets = Arc::new(MarketSnapshot::from_value(fetched?)?);
        self.loader.publish(Arc::clone(&markets), currencies);
        Ok(markets)
    }

    /// Publishes markets (and optionally currencies) without a load cycle
    pub fn set_markets(
        &self,
        markets: Vec<Market>,
        currencies: Option<Vec<Currency>>,
    ) -> Arc<MarketSnapshot> {
        self.loader.set_markets(
            MarketSnapshot::from_markets(markets),
            currencies.map(CurrencySnapshot::from_currencies),
        )
    }

    /// 로드 상태
    pub fn load_state(&self) -> LoadState {
        self.loader.state()
    }

    /// Number of network load cycles started so far
    pub fn load_cycles(&self) -> usize {
        self.loader.cycles()
    }

    pub fn markets(&self) -> Option<Arc<MarketSnapshot>> {
        self.loader.markets()
    }

    /// Fetched currencies, or the ones derived from market codes
    pub fn currencies(&self) -> Option<Arc<CurrencySnapshot>> {
        let published = self.loader.published();
        published
            .index
            .map(|index| Arc::clone(&index.currencies))
            .or(published.currencies)
    }

    pub fn staged_currencies(&self) -> Option<Arc<CurrencySnapshot>> {
        self.loader.staged_currencies()
    }

    /// 심볼로 마켓 조회
    pub fn market(&self, symbol: &str) -> CcxtResult<Market> {
        let markets = self.loader.markets().ok_or_else(|| CcxtError::ExchangeError {
            message: format!("{}: markets not loaded", self.id),
        })?;
        markets
            .get(symbol)
            .cloned()
            .ok_or_else(|| CcxtError::BadSymbol {
                symbol: symbol.to_string(),
            })
    }

    /// Every market sharing an exchange-side id (spot and swap may share one)
    pub fn markets_by_id(&self, id: &str) -> Vec<Market> {
        self.loader
            .index()
            .and_then(|index| index.markets_by_id.get(id).cloned())
            .unwrap_or_default()
    }

    pub fn currency(&self, code: &str) -> Option<Currency> {
        self.loader
            .index()
            .and_then(|index| index.currencies.get(code).cloned())
    }

    pub fn symbols(&self) -> Vec<String> {
        self.loader
            .index()
            .map(|index| index.symbols.clone())
            .unwrap_or_default()
    }

    pub fn ids(&self) -> Vec<String> {
        self.loader
            .index()
            .map(|index| index.ids.clone())
            .unwrap_or_default()
    }

    pub fn codes(&self) -> Vec<String> {
        self.loader
            .index()
            .map(|index| index.codes.clone())
            .unwrap_or_default()
    }

    // === Lifecycle ===

    /// Cancels every wait and in-flight operation of this instance. Later
    /// calls fail with `Cancelled`.
    pub fn close(&self) {
        if !self.shutdown.is_cancelled() {
            info!(exchange = %self.id, "exchange closed");
            self.shutdown.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn ensure_open(&self, operation: &str) -> CcxtResult<()> {
        if self.shutdown.is_cancelled() {
            Err(CcxtError::cancelled(operation))
        } else {
            Ok(())
        }
    }
}

async fn deadline(limit: Option<Duration>) {
    match limit {
        Some(limit) => tokio::time::sleep(limit).await,
        None => pending::<()>().await,
    }
}
