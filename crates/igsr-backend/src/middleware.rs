//! Retry wrapper for transient backend failures

use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{client::SearchBackend, Result};

/// Upper bound on retries regardless of configuration
pub const MAX_RETRIES: u32 = 1;

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRIES, Duration::from_millis(100))
    }
}

impl RetryPolicy {
    /// Retries above [`MAX_RETRIES`] are clamped
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries: max_retries.min(MAX_RETRIES),
            backoff,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

/// Attempt counters, for tests and diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryStats {
    pub attempts: u64,
    pub retries: u64,
}

/// Wraps a backend and retries connectivity failures.
///
/// Engine answers (4xx, 5xx, unreadable bodies) are returned as-is.
pub struct RetryingBackend<B> {
    inner: B,
    policy: RetryPolicy,
    attempts: AtomicU64,
    retries: AtomicU64,
}

impl<B: SearchBackend> RetryingBackend<B> {
    pub fn new(inner: B, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            attempts: AtomicU64::new(0),
            retries: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn stats(&self) -> RetryStats {
        RetryStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }

    /// Execute operation with retry logic
    pub async fn execute<F, Fut, T>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;

        loop {
            self.attempts.fetch_add(1, Ordering::Relaxed);

            match call().await {
                Ok(value) => {
                    if retries > 0 {
                        debug!(operation, retries, "backend call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && retries < self.policy.max_retries => {
                    retries += 1;
                    self.retries.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        operation,
                        attempt = retries,
                        delay = ?self.policy.backoff,
                        error = %e,
                        "transient backend failure, retrying"
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<B: SearchBackend> SearchBackend for RetryingBackend<B> {
    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        self.execute("search", || self.inner.search(index, body))
            .await
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>> {
        self.execute("get_document", || self.inner.get_document(index, id))
            .await
    }

    async fn ping(&self) -> bool {
        self.inner.ping().await
    }
}
