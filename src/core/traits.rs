//! Core trait for per-account mutual exclusion
//!
//! Both lock strategies implement [`AccountLock`]; the ledger operations are
//! generic over it so the naive baseline and the atomic implementation can be
//! swapped without touching charge/reset logic.

use crate::types::{AccountId, MeterError};
use async_trait::async_trait;
use std::future::Future;
use tracing::error;

/// Mutual exclusion of a critical section per account
///
/// Exclusion only holds among callers that go through this trait; anything that
/// writes the balance key directly bypasses it. No fairness is provided: any
/// waiter may win the next race, bounded only by each strategy's retry budget.
#[async_trait]
pub trait AccountLock: Send + Sync {
    /// Short strategy name for logs and reports
    fn name(&self) -> &'static str;

    /// Block (by polling) until this caller holds the account's lock
    async fn acquire(&self, account: &AccountId) -> Result<(), MeterError>;

    /// Clear the account's lock flag; fails with `LockRelease`
    async fn release(&self, account: &AccountId) -> Result<(), MeterError>;

    /// Run `body` exactly once while holding the account's lock
    ///
    /// Release is attempted whatever the body returned. When release fails the
    /// account stays locked until its TTL expires and that failure is what the
    /// caller sees, even if the body failed too (the body error is logged).
    async fn with_lock<T, F, Fut>(&self, account: &AccountId, body: F) -> Result<T, MeterError>
    where
        T: Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, MeterError>> + Send,
    {
        self.acquire(account).await?;

        let outcome = body().await;

        match self.release(account).await {
            Ok(()) => outcome,
            Err(release_error) => {
                if let Err(body_error) = &outcome {
                    error!(
                        account = %account,
                        error = %body_error,
                        "critical section failed and its lock could not be released"
                    );
                }
                Err(release_error)
            }
        }
    }
}
