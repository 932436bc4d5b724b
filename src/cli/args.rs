use crate::config::{AtomicLockConfig, FlagLockConfig, MeterConfig};
use crate::store::KeyEncoding;
use crate::strategy::ReplayConfig;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;

const SECONDS_PER_DAY: u64 = 60 * 60 * 24;

/// Replay charge and reset requests against an account balance meter
#[derive(Parser, Debug)]
#[command(name = "charging-engine")]
#[command(about = "Replay charge and reset requests against an account balance meter", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing replay requests
    #[arg(value_name = "INPUT", help = "Path to the input CSV file (op,account,service)")]
    pub input_file: PathBuf,

    /// Lock strategy guarding each account's balance
    #[arg(
        long = "lock",
        value_name = "LOCK",
        default_value = "atomic",
        help = "Lock strategy: 'flag' for the best-effort flag or 'atomic' for create-if-absent/CAS"
    )]
    pub lock: LockStrategyType,

    /// Balance restored by a reset
    #[arg(long = "default-balance", value_name = "AMOUNT", help = "Balance restored by a reset (default: 10000)")]
    pub default_balance: Option<Decimal>,

    /// Number of requests run concurrently per batch
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of requests run concurrently per batch (default: 30)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads of the async runtime
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Worker threads of the async runtime (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Expiry of balance and lock entries in days
    #[arg(long = "ttl-days", value_name = "DAYS", help = "Expiry of balance and lock entries in days (default: 30)")]
    pub ttl_days: Option<u64>,

    /// Backend key encoding
    #[arg(long = "key-encoding", value_name = "ENCODING", default_value = "plain")]
    pub key_encoding: KeyEncoding,

    /// Simulated store round-trip time in milliseconds
    #[arg(long = "latency-ms", value_name = "MS")]
    pub latency_ms: Option<u64>,

    /// Failed polls tolerated by the flag lock
    #[arg(long = "max-polls", value_name = "COUNT", help = "Failed polls tolerated by the flag lock (default: 10)")]
    pub max_polls: Option<u32>,

    /// Claim attempts of the atomic lock
    #[arg(long = "max-attempts", value_name = "COUNT", help = "Claim attempts of the atomic lock (default: 100)")]
    pub max_attempts: Option<u32>,
}

/// Available lock strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LockStrategyType {
    Flag,
    Atomic,
}

impl CliArgs {
    /// Create a ReplayConfig from CLI arguments
    ///
    /// Values that are not provided fall back to defaults. Zero values, and a TTL
    /// too large to represent, are rejected with a warning.
    pub fn to_replay_config(&self) -> ReplayConfig {
        let default = ReplayConfig::default();
        let meter = self.to_meter_config(&default.meter);

        let config = ReplayConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.worker_threads.unwrap_or(default.worker_threads),
            meter,
        );

        match self.latency_ms {
            Some(ms) if ms > 0 => config.with_latency(Duration::from_millis(ms)),
            _ => config,
        }
    }

    fn to_meter_config(&self, default: &MeterConfig) -> MeterConfig {
        let ttl = match self.ttl_days {
            Some(0) => {
                tracing::warn!("Invalid ttl_days (0), using default ({:?})", default.ttl);
                default.ttl
            }
            Some(days) => match days.checked_mul(SECONDS_PER_DAY) {
                Some(secs) => Duration::from_secs(secs),
                None => {
                    tracing::warn!("Invalid ttl_days ({}), using default ({:?})", days, default.ttl);
                    default.ttl
                }
            },
            None => default.ttl,
        };

        MeterConfig {
            default_balance: self.default_balance.unwrap_or(default.default_balance),
            ttl,
            charges: default.charges.clone(),
            key_encoding: self.key_encoding,
            flag_lock: FlagLockConfig::new(
                self.max_polls.unwrap_or(default.flag_lock.max_polls),
                default.flag_lock.poll_delay,
            ),
            atomic_lock: AtomicLockConfig::new(
                self.max_attempts.unwrap_or(default.atomic_lock.max_attempts),
                default.atomic_lock.min_delay,
                default.atomic_lock.max_delay,
            ),
        }
    }
}
