//! Engine configuration
//!
//! Every tunable of the ledger and the two lock strategies lives here. The retry
//! budget of each lock is the only timeout the engine has, so each lock config
//! also reports the worst-case time a caller can spend waiting before it fails.

use crate::store::KeyEncoding;
use crate::types::ChargeTable;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::warn;

/// Lifetime of every balance and lock entry since its last write
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 30);

/// Balance written by a reset unless configured otherwise
pub const DEFAULT_BALANCE: i64 = 10_000;

/// Polling budget of the best-effort flag lock
#[derive(Clone, Debug, PartialEq)]
pub struct FlagLockConfig {
    /// Failed polls tolerated before giving up
    pub max_polls: u32,
    /// Fixed sleep between two polls
    pub poll_delay: Duration,
}

impl Default for FlagLockConfig {
    fn default() -> Self {
        Self {
            max_polls: 10,
            poll_delay: Duration::from_millis(20),
        }
    }
}

impl FlagLockConfig {
    /// Create a FlagLockConfig, falling back to defaults on zero values
    pub fn new(max_polls: u32, poll_delay: Duration) -> Self {
        let default = Self::default();

        let max_polls = if max_polls == 0 {
            warn!(
                max_polls,
                fallback = default.max_polls,
                "invalid flag lock max_polls, using default"
            );
            default.max_polls
        } else {
            max_polls
        };

        Self {
            max_polls,
            poll_delay,
        }
    }

    /// Longest a caller sleeps before `LockTimeout`, excluding store round trips
    pub fn worst_case_wait(&self) -> Duration {
        self.poll_delay * self.max_polls.saturating_sub(1)
    }
}

/// Attempt budget and jitter of the atomic lock
#[derive(Clone, Debug, PartialEq)]
pub struct AtomicLockConfig {
    /// Acquire attempts before giving up
    pub max_attempts: u32,
    /// Lower bound of the randomized backoff
    pub min_delay: Duration,
    /// Upper bound of the randomized backoff
    pub max_delay: Duration,
}

impl Default for AtomicLockConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
        }
    }
}

impl AtomicLockConfig {
    /// Create an AtomicLockConfig, falling back to defaults on invalid values
    pub fn new(max_attempts: u32, min_delay: Duration, max_delay: Duration) -> Self {
        let default = Self::default();

        let max_attempts = if max_attempts == 0 {
            warn!(
                max_attempts,
                fallback = default.max_attempts,
                "invalid atomic lock max_attempts, using default"
            );
            default.max_attempts
        } else {
            max_attempts
        };

        let (min_delay, max_delay) = if min_delay > max_delay {
            warn!(
                min_delay_ms = min_delay.as_millis() as u64,
                max_delay_ms = max_delay.as_millis() as u64,
                "atomic lock jitter bounds inverted, using defaults"
            );
            (default.min_delay, default.max_delay)
        } else {
            (min_delay, max_delay)
        };

        Self {
            max_attempts,
            min_delay,
            max_delay,
        }
    }

    /// Longest a caller sleeps before `LockContention`, excluding store round trips
    pub fn worst_case_wait(&self) -> Duration {
        self.max_delay * self.max_attempts.saturating_sub(1)
    }
}

/// Ledger-wide settings shared by both lock strategies
#[derive(Clone, Debug, PartialEq)]
pub struct MeterConfig {
    /// Balance restored by a reset
    pub default_balance: Decimal,
    /// Expiry of balance and lock entries; doubles as the stuck-lock safety net
    pub ttl: Duration,
    pub charges: ChargeTable,
    pub key_encoding: KeyEncoding,
    pub flag_lock: FlagLockConfig,
    pub atomic_lock: AtomicLockConfig,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            default_balance: Decimal::from(DEFAULT_BALANCE),
            ttl: DEFAULT_TTL,
            charges: ChargeTable::default(),
            key_encoding: KeyEncoding::default(),
            flag_lock: FlagLockConfig::default(),
            atomic_lock: AtomicLockConfig::default(),
        }
    }
}
