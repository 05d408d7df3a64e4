//! Single-flight market/currency load coordination
//!
//! At most one load cycle is in flight per runtime instance. Callers arriving
//! while a cycle runs subscribe to its outcome instead of starting another
//! one, and every subscriber receives the same result.
//!
//! Two locks, never nested in opposite orders:
//! - the decision lock guards the phase and the subscriber list
//! - the publish lock guards the published snapshots, which are replaced as a
//!   unit (markets, currencies and derived indices together)

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::errors::CcxtResult;
use crate::types::{CurrencySnapshot, LoadState, MarketIndex, MarketSnapshot};

/// Outcome delivered to every subscriber of a load cycle
pub type LoadOutcome = CcxtResult<Arc<MarketSnapshot>>;

/// 게시된 마켓 데이터
///
/// Cloning is cheap: every part is an `Arc` to an immutable snapshot.
#[derive(Debug, Clone, Default)]
pub struct PublishedMarkets {
    pub markets: Option<Arc<MarketSnapshot>>,
    /// Currencies as fetched; `None` when the exchange has no currency
    /// endpoint (the index then carries currencies derived from markets)
    pub currencies: Option<Arc<CurrencySnapshot>>,
    pub index: Option<Arc<MarketIndex>>,
}

pub(crate) enum LoadDecision {
    /// Published markets can be returned as they are
    Ready(Arc<MarketSnapshot>),
    /// A cycle is in flight; wait for its outcome
    Subscribed(oneshot::Receiver<LoadOutcome>),
    /// The caller must run a new cycle; it is also subscribed to it
    Start(oneshot::Receiver<LoadOutcome>),
}

#[derive(Debug, Default)]
struct LoaderState {
    phase: LoadState,
    /// phase to fall back to when the in-flight cycle fails
    previous: LoadState,
    subscribers: Vec<oneshot::Sender<LoadOutcome>>,
}

/// 마켓 로더
#[derive(Debug, Default)]
pub struct MarketLoader {
    state: Mutex<LoaderState>,
    published: RwLock<PublishedMarkets>,
    staged_currencies: RwLock<Option<Arc<CurrencySnapshot>>>,
    cycles: AtomicUsize,
}

impl MarketLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with markets already published but no index built yet. The
    /// first non-reloading load only builds the index.
    pub fn preloaded(markets: MarketSnapshot) -> Self {
        let loader = Self::default();
        loader.published.write().markets = Some(Arc::new(markets));
        loader
    }

    pub fn state(&self) -> LoadState {
        self.state.lock().phase
    }

    /// Number of network load cycles started
    pub fn cycles(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> PublishedMarkets {
        self.published.read().clone()
    }

    pub fn markets(&self) -> Option<Arc<MarketSnapshot>> {
        self.published.read().markets.clone()
    }

    pub fn index(&self) -> Option<Arc<MarketIndex>> {
        self.published.read().index.clone()
    }

    /// Currencies fetched by the in-flight cycle, before its markets arrive
    pub fn staged_currencies(&self) -> Option<Arc<CurrencySnapshot>> {
        self.staged_currencies.read().clone()
    }

    pub(crate) fn stage_currencies(&self, currencies: Option<Arc<CurrencySnapshot>>) {
        *self.staged_currencies.write() = currencies;
    }

    /// Decides, under the decision lock, what a `load_markets(reload)` call
    /// does.
    pub(crate) fn begin(&self, reload: bool) -> LoadDecision {
        let mut state = self.state.lock();

        if state.phase == LoadState::Loading {
            let (tx, rx) = oneshot::channel();
            state.subscribers.push(tx);
            debug!(subscribers = state.subscribers.len(), "joined in-flight market load");
            return LoadDecision::Subscribed(rx);
        }

        if !reload {
            let mut published = self.published.write();
            if let Some(markets) = published.markets.clone() {
                if published.index.is_none() {
                    debug!(markets = markets.len(), "building market index for preloaded markets");
                    let index = MarketIndex::build(&markets, published.currencies.as_ref());
                    published.index = Some(Arc::new(index));
                }
                state.phase = LoadState::Loaded;
                return LoadDecision::Ready(markets);
            }
        }

        let (tx, rx) = oneshot::channel();
        state.previous = state.phase;
        state.phase = LoadState::Loading;
        state.subscribers.push(tx);
        self.cycles.fetch_add(1, Ordering::SeqCst);
        LoadDecision::Start(rx)
    }

    /// Publishes a freshly loaded snapshot. Readers see either the old or
    /// the new markets/currencies/index, never a mix.
    pub(crate) fn publish(
        &self,
        markets: Arc<MarketSnapshot>,
        currencies: Option<Arc<CurrencySnapshot>>,
    ) {
        let index = Arc::new(MarketIndex::build(&markets, currencies.as_ref()));
        *self.published.write() = PublishedMarkets {
            markets: Some(markets),
            currencies,
            index: Some(index),
        };
    }

    /// Ends the in-flight cycle and hands its outcome to every subscriber
    pub(crate) fn finish(&self, outcome: LoadOutcome) {
        let subscribers = {
            let mut state = self.state.lock();
            state.phase = match &outcome {
                Ok(_) => LoadState::Loaded,
                Err(_) => state.previous,
            };
            std::mem::take(&mut state.subscribers)
        };

        match &outcome {
            Ok(markets) => info!(
                markets = markets.len(),
                subscribers = subscribers.len(),
                "markets loaded"
            ),
            Err(e) => warn!(error = %e, subscribers = subscribers.len(), "market load failed"),
        }

        for tx in subscribers {
            // A subscriber that stopped waiting has dropped its receiver.
            let _ = tx.send(outcome.clone());
        }
    }

    /// Replaces the published markets directly, outside any load cycle
    pub(crate) fn set_markets(
        &self,
        markets: MarketSnapshot,
        currencies: Option<CurrencySnapshot>,
    ) -> Arc<MarketSnapshot> {
        let markets = Arc::new(markets);
        self.publish(markets.clone(), currencies.map(Arc::new));

        let mut state = self.state.lock();
        if state.phase == LoadState::Idle {
            state.phase = LoadState::Loaded;
        }
        markets
    }
}
