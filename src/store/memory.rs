//! In-process key-value backend
//!
//! `MemoryStore` stands in for the remote cache in the replay binary and in tests.
//! It keeps the observable contract of a real client: every primitive is a
//! separate suspension point (optionally delayed by a simulated round trip),
//! entries expire after their TTL, and a closed client refuses further calls.
//!
//! # Design
//!
//! Entries live in a `DashMap`. Each primitive touches a single key while holding
//! that key's shard lock, so individual primitives are linearizable. Composing two
//! of them (read, then write) is not, which is exactly the window the best-effort
//! flag lock is exposed to.

use super::{Entry, KvStore, StoreError, StoreResult, VersionToken};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Expiry horizon used when `now + ttl` overflows the clock
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 100);

/// Behaviour knobs for a [`MemoryStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreOptions {
    /// Offer `try_acquire` and `cas_write`
    pub atomic: bool,
    /// Simulated network delay applied before every primitive
    pub latency: Option<Duration>,
}

impl MemoryStoreOptions {
    /// Backend with read/write only
    pub fn plain() -> Self {
        Self {
            atomic: false,
            latency: None,
        }
    }

    /// Backend with create-if-absent and compare-and-swap
    pub fn atomic() -> Self {
        Self {
            atomic: true,
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency).filter(|l| !l.is_zero());
        self
    }
}

#[derive(Debug)]
struct Slot {
    value: String,
    version: VersionToken,
    expires_at: Instant,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Thread-safe in-memory store with TTL expiry
#[derive(Debug)]
pub struct MemoryStore {
    entries: DashMap<String, Slot>,
    next_version: AtomicU64,
    options: MemoryStoreOptions,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Open a new, empty store client
    pub fn open(options: MemoryStoreOptions) -> Self {
        debug!(
            atomic = options.atomic,
            latency_ms = options.latency.map(|l| l.as_millis() as u64),
            "opened in-memory store"
        );
        Self {
            entries: DashMap::new(),
            next_version: AtomicU64::new(1),
            options,
            closed: AtomicBool::new(false),
        }
    }

    async fn round_trip(&self, operation: &'static str) -> StoreResult<()> {
        if let Some(latency) = self.options.latency {
            tokio::time::sleep(latency).await;
        }
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed { operation });
        }
        Ok(())
    }

    fn require_atomic(&self, operation: &'static str) -> StoreResult<()> {
        if self.options.atomic {
            Ok(())
        } else {
            Err(StoreError::Unsupported { operation })
        }
    }

    fn slot(&self, value: &str, ttl: Duration) -> Slot {
        let now = Instant::now();
        // TTLs beyond what the clock can represent never expire in practice
        let expires_at = now.checked_add(ttl).unwrap_or(now + FAR_FUTURE);

        Slot {
            value: value.to_string(),
            version: VersionToken::new(self.next_version.fetch_add(1, Ordering::Relaxed)),
            expires_at,
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn supports_atomic(&self) -> bool {
        self.options.atomic
    }

    async fn read(&self, key: &str) -> StoreResult<Option<Entry>> {
        self.round_trip("read").await?;
        let now = Instant::now();

        if let Some(slot) = self.entries.get(key) {
            if !slot.is_expired(now) {
                return Ok(Some(Entry {
                    value: slot.value.clone(),
                    version: slot.version,
                }));
            }
        }

        self.entries.remove_if(key, |_, slot| slot.is_expired(now));
        Ok(None)
    }

    async fn write(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        self.round_trip("write").await?;
        self.entries.insert(key.to_string(), self.slot(value, ttl));
        Ok(())
    }

    async fn try_acquire(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        self.require_atomic("try_acquire")?;
        self.round_trip("try_acquire").await?;
        let now = Instant::now();

        let mut created = false;
        let mut slot = self.entries.entry(key.to_string()).or_insert_with(|| {
            created = true;
            self.slot(value, ttl)
        });
        if !created && slot.is_expired(now) {
            *slot = self.slot(value, ttl);
            created = true;
        }

        Ok(created)
    }

    async fn cas_write(
        &self,
        key: &str,
        value: &str,
        expected: &VersionToken,
        ttl: Duration,
    ) -> StoreResult<bool> {
        self.require_atomic("cas_write")?;
        self.round_trip("cas_write").await?;
        let now = Instant::now();

        let Some(mut slot) = self.entries.get_mut(key) else {
            return Ok(false);
        };
        if slot.is_expired(now) || slot.version != *expected {
            return Ok(false);
        }
        *slot = self.slot(value, ttl);

        Ok(true)
    }

    async fn close(&self) -> StoreResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(entries = self.entries.len(), "closed in-memory store");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_read_absent_key() {
        let store = MemoryStore::open(MemoryStoreOptions::plain());

        assert_eq!(store.read("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::open(MemoryStoreOptions::plain());

        store.write("k", "42", TTL).await.unwrap();
        let entry = store.read("k").await.unwrap().unwrap();

        assert_eq!(entry.value, "42");
    }

    #[tokio::test]
    async fn test_every_write_changes_version() {
        let store = MemoryStore::open(MemoryStoreOptions::plain());

        store.write("k", "same", TTL).await.unwrap();
        let first = store.read("k").await.unwrap().unwrap().version;
        store.write("k", "same", TTL).await.unwrap();
        let second = store.read("k").await.unwrap().unwrap().version;

        assert_ne!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let store = MemoryStore::open(MemoryStoreOptions::atomic());

        store.write("k", "1", Duration::from_secs(5)).await.unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.read("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.read("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_ttl_saturates() {
        let store = MemoryStore::open(MemoryStoreOptions::atomic());
        let huge = Duration::from_secs(200_000_000_000_000 * 86_400);

        store.write("k", "1", huge).await.unwrap();
        assert!(store.try_acquire("fresh", "1", Duration::MAX).await.unwrap());

        tokio::time::advance(Duration::from_secs(60 * 60 * 24 * 365)).await;
        assert_eq!(store.read("k").await.unwrap().unwrap().value, "1");
        assert!(store.read("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_plain_backend_rejects_atomic_primitives() {
        let store = MemoryStore::open(MemoryStoreOptions::plain());
        let token = VersionToken::new(1);

        assert!(!store.supports_atomic());
        assert_eq!(
            store.try_acquire("k", "1", TTL).await,
            Err(StoreError::Unsupported {
                operation: "try_acquire"
            })
        );
        assert_eq!(
            store.cas_write("k", "1", &token, TTL).await,
            Err(StoreError::Unsupported {
                operation: "cas_write"
            })
        );
    }

    #[tokio::test]
    async fn test_try_acquire_only_creator_wins() {
        let store = MemoryStore::open(MemoryStoreOptions::atomic());

        assert!(store.try_acquire("k", "1", TTL).await.unwrap());
        assert!(!store.try_acquire("k", "1", TTL).await.unwrap());
        assert_eq!(store.read("k").await.unwrap().unwrap().value, "1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_acquire_replaces_expired_entry() {
        let store = MemoryStore::open(MemoryStoreOptions::atomic());

        assert!(store.try_acquire("k", "1", Duration::from_secs(1)).await.unwrap());
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(store.try_acquire("k", "1", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn test_cas_write_requires_current_version() {
        let store = MemoryStore::open(MemoryStoreOptions::atomic());

        store.write("k", "0", TTL).await.unwrap();
        let stale = store.read("k").await.unwrap().unwrap().version;
        store.write("k", "0", TTL).await.unwrap();
        let current = store.read("k").await.unwrap().unwrap().version;

        assert!(!store.cas_write("k", "1", &stale, TTL).await.unwrap());
        assert!(store.cas_write("k", "1", &current, TTL).await.unwrap());
        assert_eq!(store.read("k").await.unwrap().unwrap().value, "1");

        // the successful swap invalidated the token it consumed
        assert!(!store.cas_write("k", "2", &current, TTL).await.unwrap());
    }

    #[tokio::test]
    async fn test_cas_write_on_absent_key_fails() {
        let store = MemoryStore::open(MemoryStoreOptions::atomic());

        let token = VersionToken::new(1);
        assert!(!store.cas_write("k", "1", &token, TTL).await.unwrap());
    }

    #[tokio::test]
    async fn test_closed_store_rejects_calls() {
        let store = MemoryStore::open(MemoryStoreOptions::atomic());

        store.close().await.unwrap();

        assert_eq!(
            store.read("k").await,
            Err(StoreError::Closed { operation: "read" })
        );
        assert_eq!(
            store.write("k", "1", TTL).await,
            Err(StoreError::Closed { operation: "write" })
        );
        // closing twice is harmless
        assert!(store.close().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_try_acquire_has_single_winner() {
        let store = Arc::new(MemoryStore::open(MemoryStoreOptions::atomic()));
        let mut handles = vec![];

        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.try_acquire("lock", "1", TTL).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }
}
