//! Lock strategies
//!
//! - [`FlagLock`]: best-effort flag for stores with only read/write (naive baseline)
//! - [`AtomicLock`]: create-if-absent / compare-and-swap acquire (production path)
//!
//! Both keep the same flag entry per account under `{accountId}/balance/locked`:
//! `"1"` while held, `"0"` (or absent) when free. Releasing is the same
//! unconditional write of `"0"` for both.

pub mod atomic;
pub mod flag;

pub use atomic::AtomicLock;
pub use flag::FlagLock;

use crate::config::MeterConfig;
use crate::store::{Entry, KeyEncoding, KvStore, StoreResult, VersionToken};
use crate::types::{AccountId, MeterError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub(crate) const LOCKED: &str = "1";
pub(crate) const UNLOCKED: &str = "0";

pub(crate) fn is_locked(entry: Option<&Entry>) -> bool {
    entry.is_some_and(|entry| entry.value == LOCKED)
}

/// Store access to an account's lock flag
#[derive(Clone)]
pub(crate) struct LockFlag {
    store: Arc<dyn KvStore>,
    ttl: Duration,
    encoding: KeyEncoding,
}

impl LockFlag {
    pub(crate) fn new(store: Arc<dyn KvStore>, config: &MeterConfig) -> Self {
        Self {
            store,
            ttl: config.ttl,
            encoding: config.key_encoding,
        }
    }

    fn key(&self, account: &AccountId) -> String {
        self.encoding.encode(&account.lock_key())
    }

    pub(crate) async fn read(&self, account: &AccountId) -> StoreResult<Option<Entry>> {
        self.store.read(&self.key(account)).await
    }

    /// Unconditional set
    pub(crate) async fn set(&self, account: &AccountId) -> StoreResult<()> {
        self.store.write(&self.key(account), LOCKED, self.ttl).await
    }

    /// Set only if no flag entry exists yet
    pub(crate) async fn create(&self, account: &AccountId) -> StoreResult<bool> {
        self.store.try_acquire(&self.key(account), LOCKED, self.ttl).await
    }

    /// Set only if the flag is still at the version observed by a read
    pub(crate) async fn swap(&self, account: &AccountId, observed: &VersionToken) -> StoreResult<bool> {
        self.store
            .cas_write(&self.key(account), LOCKED, observed, self.ttl)
            .await
    }

    /// Unconditional clear; never retried
    pub(crate) async fn clear(&self, account: &AccountId) -> Result<(), MeterError> {
        match self.store.write(&self.key(account), UNLOCKED, self.ttl).await {
            Ok(()) => {
                debug!(account = %account, "lock released");
                Ok(())
            }
            Err(cause) => {
                error!(
                    account = %account,
                    error = %cause,
                    ttl_secs = self.ttl.as_secs(),
                    "lock release failed, account stays locked until TTL expiry"
                );
                Err(MeterError::lock_release(account.as_str(), &cause))
            }
        }
    }
}
