//! Fault injection for unit tests

use super::{Entry, KvStore, MemoryStore, MemoryStoreOptions, StoreError, StoreResult, VersionToken};
use async_trait::async_trait;
use std::time::Duration;

type WriteFault = Box<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// `MemoryStore` whose unconditional writes fail when the predicate matches
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    write_fault: WriteFault,
}

impl FlakyStore {
    pub(crate) fn new(
        options: MemoryStoreOptions,
        write_fault: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: MemoryStore::open(options),
            write_fault: Box::new(write_fault),
        }
    }
}

#[async_trait]
impl KvStore for FlakyStore {
    fn supports_atomic(&self) -> bool {
        self.inner.supports_atomic()
    }

    async fn read(&self, key: &str) -> StoreResult<Option<Entry>> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        if (self.write_fault)(key, value) {
            return Err(StoreError::Unavailable {
                operation: "write",
                message: "injected fault".to_string(),
            });
        }
        self.inner.write(key, value, ttl).await
    }

    async fn try_acquire(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        self.inner.try_acquire(key, value, ttl).await
    }

    async fn cas_write(
        &self,
        key: &str,
        value: &str,
        expected: &VersionToken,
        ttl: Duration,
    ) -> StoreResult<bool> {
        self.inner.cas_write(key, value, expected, ttl).await
    }

    async fn close(&self) -> StoreResult<()> {
        self.inner.close().await
    }
}
