//! Rate limiting for API requests

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

use crate::errors::{CcxtError, CcxtResult};
use crate::runtime::CancelToken;

/// Admission tolerance for accumulated floating point drift
const EPSILON: f64 = 1e-9;

/// 레이트 리미터 통계
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateLimiterStats {
    /// 통과한 요청 수
    pub admitted: u64,
    /// 대기가 필요했던 요청 수
    pub delayed: u64,
    /// 누적 대기 시간
    pub total_wait: Duration,
}

#[derive(Debug)]
struct Bucket {
    level: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, capacity: f64, refill_rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.level = (self.level + elapsed * refill_rate).min(capacity);
        self.last_refill = now;
    }
}

/// 레이트 리미터
///
/// 연속 리필 토큰 버킷. Requests are admitted strictly in arrival order
/// regardless of their cost: a waiter holds the turnstile until it has been
/// admitted, and `tokio::sync::Mutex` hands the turnstile over FIFO.
///
/// A cost above the capacity can never be held by the bucket. Such a request
/// waits `(cost - level) / rate` from the start of its turn and then leaves
/// the bucket empty, so the level never goes negative.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    /// tokens per second
    refill_rate: f64,
    turnstile: tokio::sync::Mutex<()>,
    bucket: Mutex<Bucket>,
    stats: Mutex<RateLimiterStats>,
}

impl RateLimiter {
    /// 새로운 레이트 리미터 생성
    ///
    /// # Arguments
    /// * `rate_limit_ms` - 요청 간 최소 간격 (밀리초). capacity 1, refill 1000/ms per second
    pub fn new(rate_limit_ms: u64) -> Self {
        Self::with_capacity(rate_limit_ms, 1.0)
    }

    /// Bucket of `capacity` tokens refilled at one token per `rate_limit_ms`
    pub fn with_capacity(rate_limit_ms: u64, capacity: f64) -> Self {
        let refill_rate = 1000.0 / rate_limit_ms.max(1) as f64;
        Self::from_rate(capacity, refill_rate)
    }

    /// Bucket of `capacity` tokens refilled at `refill_rate` tokens per second.
    /// Non-positive or non-finite values fall back to 1.
    pub fn from_rate(capacity: f64, refill_rate: f64) -> Self {
        let capacity = positive_or_one(capacity);
        Self {
            capacity,
            refill_rate: positive_or_one(refill_rate),
            turnstile: tokio::sync::Mutex::new(()),
            bucket: Mutex::new(Bucket {
                level: capacity,
                last_refill: Instant::now(),
            }),
            stats: Mutex::new(RateLimiterStats::default()),
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// 토큰 획득 (필요시 대기)
    pub async fn throttle(&self, cost: f64) {
        let _turn = self.turnstile.lock().await;
        let started = Instant::now();
        let mut delayed = false;
        loop {
            match self.admit(cost) {
                Admission::Admitted => break,
                Admission::Retry(wait) => {
                    delayed = true;
                    tokio::time::sleep(wait).await;
                }
                Admission::Drain(wait) => {
                    delayed = true;
                    tokio::time::sleep(wait).await;
                    self.drain(cost);
                    break;
                }
            }
        }
        self.record(delayed, started.elapsed());
    }

    /// Like [`throttle`](Self::throttle), but gives up when `cancel` fires.
    /// A cancelled waiter consumes nothing and leaves the queue.
    pub async fn throttle_with(&self, cost: f64, cancel: &CancelToken) -> CcxtResult<()> {
        let _turn = tokio::select! {
            turn = self.turnstile.lock() => turn,
            _ = cancel.cancelled() => return Err(CcxtError::cancelled("throttle")),
        };
        let started = Instant::now();
        let mut delayed = false;
        loop {
            let (wait, drains) = match self.admit(cost) {
                Admission::Admitted => break,
                Admission::Retry(wait) => (wait, false),
                Admission::Drain(wait) => (wait, true),
            };
            delayed = true;
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = cancel.cancelled() => return Err(CcxtError::cancelled("throttle")),
            }
            if drains {
                self.drain(cost);
                break;
            }
        }
        self.record(delayed, started.elapsed());
        Ok(())
    }

    /// 토큰 획득 시도 (블로킹 없음)
    ///
    /// Fails when someone is already queued, so it never jumps the line. A
    /// cost above the capacity always has to wait and is never admitted here.
    pub fn try_acquire(&self, cost: f64) -> bool {
        let Ok(_turn) = self.turnstile.try_lock() else {
            return false;
        };
        let admitted = matches!(self.admit(cost), Admission::Admitted);
        if admitted {
            self.record(false, Duration::ZERO);
        }
        admitted
    }

    /// 현재 사용 가능한 토큰 수
    pub fn available_tokens(&self) -> f64 {
        let mut bucket = self.bucket.lock();
        bucket.refill(self.capacity, self.refill_rate);
        bucket.level
    }

    pub fn stats(&self) -> RateLimiterStats {
        *self.stats.lock()
    }

    /// Deducts `cost` if the bucket covers it, otherwise says how long to
    /// wait before the next attempt.
    fn admit(&self, cost: f64) -> Admission {
        let cost = effective_cost(cost);
        let mut bucket = self.bucket.lock();
        bucket.refill(self.capacity, self.refill_rate);

        if bucket.level + EPSILON >= cost {
            bucket.level = (bucket.level - cost).clamp(0.0, self.capacity);
            trace!(cost, level = bucket.level, "throttle admitted");
            Admission::Admitted
        } else {
            let wait = wait_for(cost - bucket.level, self.refill_rate);
            if cost > self.capacity {
                Admission::Drain(wait)
            } else {
                Admission::Retry(wait)
            }
        }
    }

    /// Settles an oversized request after its full wait: the bucket is empty
    fn drain(&self, cost: f64) {
        let mut bucket = self.bucket.lock();
        bucket.level = 0.0;
        bucket.last_refill = Instant::now();
        trace!(cost, "throttle admitted, bucket drained");
    }

    fn record(&self, delayed: bool, waited: Duration) {
        let mut stats = self.stats.lock();
        stats.admitted += 1;
        if delayed {
            stats.delayed += 1;
            stats.total_wait += waited;
        }
    }
}

enum Admission {
    Admitted,
    /// Not enough tokens yet; try again after the wait
    Retry(Duration),
    /// Cost exceeds capacity; admitted with an empty bucket after the wait
    Drain(Duration),
}

fn effective_cost(cost: f64) -> f64 {
    if cost.is_finite() && cost > 0.0 {
        cost
    } else {
        0.0
    }
}

fn wait_for(deficit: f64, refill_rate: f64) -> Duration {
    Duration::try_from_secs_f64(deficit / refill_rate).unwrap_or(Duration::MAX)
}

fn positive_or_one(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}
