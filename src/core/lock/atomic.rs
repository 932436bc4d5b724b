//! Atomic lock over create-if-absent / compare-and-swap
//!
//! An acquire attempt reads the flag and then claims it with a primitive the
//! store executes atomically:
//!
//! ```text
//! read flag ──► absent  ──► try_acquire("1")          ─┐
//!           ├─► "0"     ──► cas_write("1", version)    ├─► won?  ──► held
//!           └─► "1"     ──► held by someone else      ─┘   lost ──► jittered sleep, retry
//! ```
//!
//! Two callers reading the same free flag cannot both win: the creator, or the
//! first swap against the observed version, invalidates the other's claim. Losers
//! back off for a random delay so that a crowd of waiters does not retry in
//! lockstep. The attempt budget bounds the total wait.

use super::{LockFlag, LOCKED};
use crate::config::{AtomicLockConfig, MeterConfig};
use crate::core::traits::AccountLock;
use crate::store::KvStore;
use crate::types::{AccountId, MeterError};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Lock built on the store's atomic primitives
pub struct AtomicLock {
    flag: LockFlag,
    config: AtomicLockConfig,
}

impl AtomicLock {
    /// Fails with `UnsupportedBackend` when the store has no atomic primitives
    pub fn new(store: Arc<dyn KvStore>, config: &MeterConfig) -> Result<Self, MeterError> {
        if !store.supports_atomic() {
            return Err(MeterError::UnsupportedBackend {
                operation: "try_acquire/cas_write".to_string(),
            });
        }

        Ok(Self {
            flag: LockFlag::new(store, config),
            config: config.atomic_lock.clone(),
        })
    }

    pub fn config(&self) -> &AtomicLockConfig {
        &self.config
    }

    /// One read-and-claim round; `Ok(false)` when another caller holds or won the flag
    async fn try_claim(&self, account: &AccountId) -> Result<bool, MeterError> {
        let claimed = match self.flag.read(account).await? {
            None => self.flag.create(account).await?,
            Some(entry) if entry.value != LOCKED => self.flag.swap(account, &entry.version).await?,
            Some(_) => false,
        };
        Ok(claimed)
    }

    fn backoff(&self) -> Duration {
        let min = self.config.min_delay.as_micros() as u64;
        // inverted bounds collapse to `min`
        let max = (self.config.max_delay.as_micros() as u64).max(min);
        Duration::from_micros(rand::thread_rng().gen_range(min..=max))
    }
}

#[async_trait]
impl AccountLock for AtomicLock {
    fn name(&self) -> &'static str {
        "atomic"
    }

    async fn acquire(&self, account: &AccountId) -> Result<(), MeterError> {
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            if self.try_claim(account).await? {
                debug!(account = %account, attempt, "atomic lock acquired");
                return Ok(());
            }
            if attempt < max_attempts {
                let delay = self.backoff();
                tokio::time::sleep(delay).await;
            }
        }

        warn!(account = %account, attempts = max_attempts, "lock contention, giving up");
        Err(MeterError::lock_contention(account.as_str(), max_attempts))
    }

    async fn release(&self, account: &AccountId) -> Result<(), MeterError> {
        self.flag.clear(account).await
    }
}
