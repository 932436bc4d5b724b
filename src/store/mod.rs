//! Key-value store capability
//!
//! The engine never talks to a concrete cache client. It is handed an explicitly
//! constructed [`KvStore`] and uses only the primitives below, each of which is a
//! network call that may fail on its own:
//!
//! - `read` / `write`: unconditional, available on every backend
//! - `try_acquire`: atomic create-if-absent
//! - `cas_write`: atomic update guarded by the version token of a previous read
//!
//! Backends that cannot offer the two atomic primitives report it through
//! [`KvStore::supports_atomic`] and fail those calls with [`StoreError::Unsupported`].

pub mod memory;

pub use memory::{MemoryStore, MemoryStoreOptions};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::ValueEnum;
use std::time::Duration;
use thiserror::Error;

/// Opaque version of a stored value
///
/// Only meaningful when handed back to the backend that produced it. Compare for
/// equality, never inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionToken(u64);

impl VersionToken {
    pub fn new(raw: u64) -> Self {
        VersionToken(raw)
    }
}

/// A value read from the store together with its current version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub value: String,
    pub version: VersionToken,
}

/// Failure of a single store primitive
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{operation} failed: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} on a closed store client")]
    Closed { operation: &'static str },

    #[error("{operation} is not supported by this backend")]
    Unsupported { operation: &'static str },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Remote cache primitives
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Whether `try_acquire` and `cas_write` are available
    fn supports_atomic(&self) -> bool;

    /// Current value and version, `None` when absent or expired
    async fn read(&self, key: &str) -> StoreResult<Option<Entry>>;

    /// Unconditional write; (re)starts the entry's TTL
    async fn write(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Create the entry only if it does not exist; true for the creator alone
    async fn try_acquire(&self, _key: &str, _value: &str, _ttl: Duration) -> StoreResult<bool> {
        Err(StoreError::Unsupported {
            operation: "try_acquire",
        })
    }

    /// Replace the entry only if its version still equals `expected`
    async fn cas_write(
        &self,
        _key: &str,
        _value: &str,
        _expected: &VersionToken,
        _ttl: Duration,
    ) -> StoreResult<bool> {
        Err(StoreError::Unsupported {
            operation: "cas_write",
        })
    }

    /// End the client's lifecycle; every later call fails with `Closed`
    async fn close(&self) -> StoreResult<()>;
}

/// How logical keys are mapped onto backend keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum KeyEncoding {
    /// Stored verbatim
    #[default]
    Plain,
    /// Base64 of the logical key, for backends that reject spaces and control bytes
    Base64,
}

impl KeyEncoding {
    pub fn encode(&self, logical: &str) -> String {
        match self {
            KeyEncoding::Plain => logical.to_string(),
            KeyEncoding::Base64 => STANDARD.encode(logical),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing;
