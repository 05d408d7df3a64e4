//! Spawned tasks with a one-shot completion channel
//!
//! Every asynchronous runtime operation runs on its own tokio task and reports
//! exactly one terminal value. A panic inside the task is caught at the task
//! boundary and delivered as [`CcxtError::TaskFailed`]. Dropping the handle
//! stops the wait but not the task.

use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::oneshot;
use tracing::warn;

use super::CancelToken;
use crate::errors::{CcxtError, CcxtResult};

/// 태스크 완료 핸들
#[derive(Debug)]
pub struct TaskHandle<T> {
    name: String,
    rx: oneshot::Receiver<CcxtResult<T>>,
}

/// Spawns `future` and returns the receiving side of its completion channel
pub fn spawn_task<T, F>(name: impl Into<String>, future: F) -> TaskHandle<T>
where
    T: Send + 'static,
    F: Future<Output = CcxtResult<T>> + Send + 'static,
{
    let name = name.into();
    let (tx, rx) = oneshot::channel();
    let task_name = name.clone();

    tokio::spawn(async move {
        let result = match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(operation = %task_name, %message, "task panicked");
                Err(CcxtError::TaskFailed { message })
            }
        };
        // The receiver may have stopped waiting; the result is simply dropped.
        let _ = tx.send(result);
    });

    TaskHandle { name, rx }
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 결과 대기
    pub async fn join(self) -> CcxtResult<T> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(CcxtError::TaskFailed {
                message: format!("{} dropped its completion channel", self.name),
            }),
        }
    }

    /// Waits for the result unless `cancel` fires first
    pub async fn join_with(self, cancel: &CancelToken) -> CcxtResult<T> {
        let TaskHandle { name, mut rx } = self;
        tokio::select! {
            biased;
            result = &mut rx => match result {
                Ok(result) => result,
                Err(_) => Err(CcxtError::TaskFailed {
                    message: format!("{name} dropped its completion channel"),
                }),
            },
            _ = cancel.cancelled() => Err(CcxtError::Cancelled { operation: name }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
