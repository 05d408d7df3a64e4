//! Mock [`Transport`] for testing.
//!
//! Responses are scripted per operation name. Each call pops the next
//! scripted result; the last one is repeated once the queue is down to it.
//! Unscripted operations answer `{}`.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::client::{EndpointRequest, Transport};
use crate::errors::CcxtResult;

pub struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<CcxtResult<Value>>>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<EndpointRequest>>,
    call_count: Arc<AtomicU32>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            delay: None,
            requests: Mutex::new(Vec::new()),
            call_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Answer `operation` with `value`
    pub fn with_response(self, operation: &str, value: Value) -> Self {
        self.with_results(operation, vec![Ok(value)])
    }

    /// Answer `operation` with `results` in order, repeating the last one
    pub fn with_results(self, operation: &str, results: Vec<CcxtResult<Value>>) -> Self {
        self.responses
            .lock()
            .insert(operation.to_string(), results.into());
        self
    }

    /// Sleep before answering every request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<EndpointRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get a shared counter for asserting call counts after the transport
    /// has been moved into an exchange.
    pub fn counter(&self) -> Arc<AtomicU32> {
        self.call_count.clone()
    }

    fn next_result(&self, operation: &str) -> CcxtResult<Value> {
        let mut responses = self.responses.lock();
        match responses.get_mut(operation) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(|| Ok(json!({}))),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| Ok(json!({}))),
            None => Ok(json!({})),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: EndpointRequest) -> CcxtResult<Value> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let operation = request.name.clone();
        self.requests.lock().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_result(&operation)
    }
}
