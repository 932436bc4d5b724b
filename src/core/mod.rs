//! Core business logic module
//!
//! This module contains the balance metering components:
//! - `traits` - The `AccountLock` abstraction shared by both lock strategies
//! - `lock` - Best-effort flag lock and atomic lock implementations
//! - `ledger` - Balance reads and writes against the key-value store
//! - `engine` - Charge and reset orchestration

pub mod engine;
pub mod ledger;
pub mod lock;
pub mod traits;

pub use engine::ChargingEngine;
pub use ledger::BalanceLedger;
pub use lock::{AtomicLock, FlagLock};
pub use traits::AccountLock;
