//! Dynamic dispatch resolver
//!
//! Concrete exchanges override a subset of the shared named operations; the
//! rest fall back to the base operations defined here. The method surface is
//! built once per runtime instance (the warm-up pass): base operations, then
//! the exchange's overrides and additions, then every compiled endpoint that
//! no operation shadows. After warm-up the cache is read-only.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use once_cell::sync::OnceCell;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::task::{spawn_task, TaskHandle};
use super::{BaseExchange, CancelToken};
use crate::errors::{CcxtError, CcxtResult};
use crate::types::{ApiTable, ExchangeDefinition};
use crate::utils::{as_bool, time::now_ms};

/// Positional operation arguments
pub type OperationArgs = Vec<Value>;

type Handler = Arc<dyn Fn(OperationContext, OperationArgs) -> BoxFuture<'static, CcxtResult<Value>> + Send + Sync>;

/// What an operation body gets to work with: the runtime instance and the
/// cancellation token of the call that started it.
#[derive(Clone)]
pub struct OperationContext {
    exchange: Arc<BaseExchange>,
    cancel: CancelToken,
}

impl OperationContext {
    pub(crate) fn new(exchange: Arc<BaseExchange>, cancel: CancelToken) -> Self {
        Self { exchange, cancel }
    }

    pub fn exchange(&self) -> &Arc<BaseExchange> {
        &self.exchange
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Calls a compiled endpoint under this call's cancellation token
    pub async fn call_endpoint(&self, name: &str, params: Value) -> CcxtResult<Value> {
        self.exchange.call_endpoint_with(name, params, &self.cancel).await
    }

    /// Invokes another operation by name (resolving overrides first)
    pub async fn invoke(&self, name: &str, args: OperationArgs) -> CcxtResult<Value> {
        self.exchange.invoke_with(name, args, &self.cancel).await
    }
}

impl Deref for OperationContext {
    type Target = BaseExchange;

    fn deref(&self) -> &Self::Target {
        &self.exchange
    }
}

/// 등록된 오퍼레이션
#[derive(Clone)]
pub struct Operation {
    arity: usize,
    variadic: bool,
    handler: Handler,
}

impl Operation {
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("arity", &self.arity)
            .field("variadic", &self.variadic)
            .finish_non_exhaustive()
    }
}

/// Operation name -> implementation
///
/// Used both for the shared base operations and for the table of overrides a
/// concrete exchange returns from [`ExchangeDefinition::operations`].
#[derive(Clone, Debug, Default)]
pub struct OperationTable {
    operations: HashMap<String, Operation>,
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation taking at most `arity` positional arguments
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, arity: usize, handler: F) -> &mut Self
    where
        F: Fn(OperationContext, OperationArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CcxtResult<Value>> + Send + 'static,
    {
        self.insert(name.into(), arity, false, handler);
        self
    }

    /// Registers an operation whose last parameter collects every trailing
    /// argument into a list. `arity` counts that rest parameter.
    pub fn register_variadic<F, Fut>(&mut self, name: impl Into<String>, arity: usize, handler: F) -> &mut Self
    where
        F: Fn(OperationContext, OperationArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CcxtResult<Value>> + Send + 'static,
    {
        self.insert(name.into(), arity.max(1), true, handler);
        self
    }

    /// Builder form of [`register`](Self::register)
    pub fn with<F, Fut>(mut self, name: impl Into<String>, arity: usize, handler: F) -> Self
    where
        F: Fn(OperationContext, OperationArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CcxtResult<Value>> + Send + 'static,
    {
        self.register(name, arity, handler);
        self
    }

    fn insert<F, Fut>(&mut self, name: String, arity: usize, variadic: bool, handler: F)
    where
        F: Fn(OperationContext, OperationArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CcxtResult<Value>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |ctx, args| handler(ctx, args).boxed());
        self.operations.insert(
            name,
            Operation {
                arity,
                variadic,
                handler,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }
}

/// Where a resolved method comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSource {
    /// Shared base implementation
    Base,
    /// Supplied by the concrete exchange
    Override,
    /// A compiled endpoint, called through the transport
    Endpoint,
}

/// 메서드 캐시 항목
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub arity: usize,
    pub variadic: bool,
    pub source: MethodSource,
}

#[derive(Clone)]
enum Target {
    Operation(Operation),
    Endpoint,
}

#[derive(Clone)]
struct CachedMethod {
    info: MethodInfo,
    target: Target,
}

/// 디스패처
pub struct Dispatcher {
    definition: Arc<dyn ExchangeDefinition>,
    endpoints: Arc<ApiTable>,
    cache: OnceCell<HashMap<String, CachedMethod>>,
    warm_ups: AtomicUsize,
}

impl Dispatcher {
    pub fn new(definition: Arc<dyn ExchangeDefinition>, endpoints: Arc<ApiTable>) -> Self {
        Self {
            definition,
            endpoints,
            cache: OnceCell::new(),
            warm_ups: AtomicUsize::new(0),
        }
    }

    /// Number of warm-up passes performed; at most 1
    pub fn warm_up_count(&self) -> usize {
        self.warm_ups.load(Ordering::SeqCst)
    }

    pub fn is_warm(&self) -> bool {
        self.cache.get().is_some()
    }

    fn methods(&self) -> &HashMap<String, CachedMethod> {
        // Concurrent first callers block here until the single pass finishes.
        self.cache.get_or_init(|| self.warm_up())
    }

    fn warm_up(&self) -> HashMap<String, CachedMethod> {
        self.warm_ups.fetch_add(1, Ordering::SeqCst);
        let mut methods = HashMap::new();

        // Endpoints go in first so that named operations shadow them.
        for name in self.endpoints.keys() {
            methods.insert(
                name.clone(),
                CachedMethod {
                    info: MethodInfo {
                        name: name.clone(),
                        arity: 1,
                        variadic: false,
                        source: MethodSource::Endpoint,
                    },
                    target: Target::Endpoint,
                },
            );
        }

        let layers = [
            (base_operations(), MethodSource::Base),
            (self.definition.operations(), MethodSource::Override),
        ];
        let mut overrides = 0;
        for (table, source) in layers {
            for (name, operation) in table.operations {
                if source == MethodSource::Override {
                    overrides += 1;
                }
                methods.insert(
                    name.clone(),
                    CachedMethod {
                        info: MethodInfo {
                            name,
                            arity: operation.arity,
                            variadic: operation.variadic,
                            source,
                        },
                        target: Target::Operation(operation),
                    },
                );
            }
        }

        debug!(
            exchange = self.definition.id(),
            methods = methods.len(),
            endpoints = self.endpoints.len(),
            overrides,
            "dispatch cache warmed up"
        );
        methods
    }

    /// Looks up a method; `None` when the name is unknown
    pub fn resolve(&self, name: &str) -> Option<MethodInfo> {
        self.methods().get(name).map(|method| method.info.clone())
    }

    /// Sorted names of every resolvable method
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods().keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolves `name`, shapes `args` and runs the method on its own task
    pub(crate) fn spawn(
        &self,
        exchange: Arc<BaseExchange>,
        name: &str,
        args: OperationArgs,
        cancel: CancelToken,
    ) -> CcxtResult<TaskHandle<Value>> {
        let method = self
            .methods()
            .get(name)
            .cloned()
            .ok_or_else(|| CcxtError::UnknownOperation {
                name: name.to_string(),
            })?;
        let args = shape_args(&method.info, args)?;
        let ctx = OperationContext::new(exchange, cancel);

        let handle = match method.target {
            // Built inside the task so a panicking handler is caught there too.
            Target::Operation(operation) => {
                spawn_task(name, async move { (operation.handler)(ctx, args).await })
            }
            Target::Endpoint => {
                let name = name.to_string();
                let params = args.into_iter().next().unwrap_or(Value::Null);
                spawn_task(name.clone(), async move {
                    ctx.exchange.execute_endpoint(&name, params, &ctx.cancel).await
                })
            }
        };
        Ok(handle)
    }
}

/// Pads missing positional arguments with `null` and folds trailing
/// arguments into the rest parameter of a variadic method.
pub fn shape_args(info: &MethodInfo, mut args: OperationArgs) -> CcxtResult<OperationArgs> {
    if info.variadic {
        let fixed = info.arity.saturating_sub(1);
        let rest = if args.len() > fixed {
            args.split_off(fixed)
        } else {
            Vec::new()
        };
        args.resize(fixed, Value::Null);
        args.push(Value::Array(rest));
        Ok(args)
    } else if args.len() > info.arity {
        Err(CcxtError::ArgumentsMismatch {
            name: info.name.clone(),
            expected: info.arity,
            received: args.len(),
        })
    } else {
        args.resize(info.arity, Value::Null);
        Ok(args)
    }
}

fn arg_bool(args: &[Value], index: usize) -> bool {
    args.get(index).and_then(as_bool).unwrap_or(false)
}

/// Shared base operations every exchange inherits
pub fn base_operations() -> OperationTable {
    let mut table = OperationTable::new();

    // loadMarkets(reload, params)
    table.register("loadMarkets", 2, |ctx, args| async move {
        let reload = arg_bool(&args, 0);
        let markets = ctx
            .exchange
            .load_markets_with(reload, &ctx.cancel)
            .await?;
        Ok(markets.to_value())
    });

    // fetchMarkets(params): whatever is currently published
    table.register("fetchMarkets", 1, |ctx, _args| async move {
        Ok(ctx
            .markets()
            .map(|markets| markets.to_value())
            .unwrap_or_else(|| Value::Array(Vec::new())))
    });

    // fetchCurrencies(params): whatever is currently published
    table.register("fetchCurrencies", 1, |ctx, _args| async move {
        Ok(ctx
            .currencies()
            .map(|currencies| currencies.to_value())
            .unwrap_or_else(|| json!({})))
    });

    table.register("fetchTime", 1, |_ctx, _args| async move {
        Err(CcxtError::not_supported("fetchTime"))
    });

    // fetchStatus(params): server time when fetchTime is available, local time otherwise
    table.register("fetchStatus", 1, |ctx, args| async move {
        let updated = if ctx.has("fetchTime") {
            ctx.invoke("fetchTime", args).await?
        } else {
            json!(now_ms())
        };
        Ok(json!({ "status": "ok", "updated": updated }))
    });

    table.register("fetchTicker", 2, |_ctx, _args| async move {
        Err(CcxtError::not_supported("fetchTicker"))
    });

    table.register("fetchOrderBook", 3, |_ctx, _args| async move {
        Err(CcxtError::not_supported("fetchOrderBook"))
    });

    table
}
