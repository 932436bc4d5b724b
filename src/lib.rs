//! Rust Charging Engine Library
//! # Overview
//!
//! This library meters per-account balances stored in a key-value cache. Each
//! charge reads the balance, authorizes the service's fixed amount if the balance
//! covers it, and writes the debited balance back, all inside a per-account lock
//! kept in the same cache.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (AccountId, ServiceType, requests and results, errors)
//! - [`store`] - The key-value capability and its in-memory backend
//! - [`config`] - Ledger and lock tunables
//! - [`core`] - Business logic components:
//!   - [`core::lock`] - The best-effort flag lock and the atomic lock
//!   - [`core::ledger`] - Balance reads and writes
//!   - [`core::engine`] - Charge and reset orchestration
//! - [`io`] - CSV replay input and response output
//! - [`strategy`] - The concurrent replay pipeline
//! - [`cli`] - CLI arguments parsing
//!
//! # Services
//!
//! | Service   | Charge |
//! |-----------|--------|
//! | `voice`   | 5      |
//! | `message` | 1      |
//! | `data`    | 2      |
//!
//! # Lock Strategies
//!
//! - [`FlagLock`]: polls an unconditional flag, then sets it. Two callers can both
//!   observe the flag free and both proceed, so it does not guarantee mutual exclusion.
//! - [`AtomicLock`]: claims the flag with create-if-absent or compare-and-swap and
//!   retries with jittered backoff. At most one caller holds it at a time.

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod store;
pub mod strategy;
pub mod types;

pub use config::MeterConfig;
pub use core::{AccountLock, AtomicLock, BalanceLedger, ChargingEngine, FlagLock};
pub use store::{KeyEncoding, KvStore, MemoryStore, MemoryStoreOptions};
pub use types::{
    AccountId, ChargeRequest, ChargeResult, ChargeTable, MeterError, ResetRequest, ResetResult,
    ServiceType,
};
