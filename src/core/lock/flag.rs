//! Best-effort flag lock (naive baseline)
//!
//! For stores that only offer unconditional read and write. Acquisition polls the
//! flag until it reads as free, then writes it as held. Those are two separate
//! store calls: two callers can both read "free" before either write lands, and
//! both then run their critical sections concurrently. Nothing here closes that
//! window; the lock only narrows it. Keep this strategy for comparison against
//! [`AtomicLock`](super::AtomicLock), not for production traffic.

use super::{is_locked, LockFlag};
use crate::config::{FlagLockConfig, MeterConfig};
use crate::core::traits::AccountLock;
use crate::store::KvStore;
use crate::types::{AccountId, MeterError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Check-then-set lock over a plain key-value store
pub struct FlagLock {
    flag: LockFlag,
    config: FlagLockConfig,
}

impl FlagLock {
    /// Works over any backend, atomic primitives are never used
    pub fn new(store: Arc<dyn KvStore>, config: &MeterConfig) -> Self {
        Self {
            flag: LockFlag::new(store, config),
            config: config.flag_lock.clone(),
        }
    }

    pub fn config(&self) -> &FlagLockConfig {
        &self.config
    }
}

#[async_trait]
impl AccountLock for FlagLock {
    fn name(&self) -> &'static str {
        "flag"
    }

    async fn acquire(&self, account: &AccountId) -> Result<(), MeterError> {
        let mut failed_polls = 0u32;

        loop {
            let current = self.flag.read(account).await?;
            if !is_locked(current.as_ref()) {
                break;
            }

            failed_polls += 1;
            if failed_polls >= self.config.max_polls {
                warn!(account = %account, polls = failed_polls, "lock wait timed out");
                return Err(MeterError::lock_timeout(account.as_str(), failed_polls));
            }
            tokio::time::sleep(self.config.poll_delay).await;
        }

        // Not atomic with the read above: a concurrent caller may be here too.
        self.flag.set(account).await?;
        debug!(account = %account, failed_polls, "flag lock set");

        Ok(())
    }

    async fn release(&self, account: &AccountId) -> Result<(), MeterError> {
        self.flag.clear(account).await
    }
}
