//! Concurrent replay strategy
//!
//! Replays charge and reset requests from a CSV file against an in-memory store
//! so that the two lock strategies can be compared under real concurrency.
//!
//! # Architecture
//!
//! ```text
//! ReplayStrategy
//!     ├── ReplayConfig (batch_size, worker_threads, latency, MeterConfig)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── MemoryStore (one per run, closed at the end)
//!     └── ChargingEngine<FlagLock | AtomicLock>
//!         └── BalanceLedger
//! ```
//!
//! Batches run one after another. Every request of a batch is spawned onto the
//! tokio multi-threaded runtime at once, so requests for the same account
//! inside a batch contend for its lock. Responses are collected in input order.

use crate::cli::LockStrategyType;
use crate::config::MeterConfig;
use crate::core::{AccountLock, AtomicLock, BalanceLedger, ChargingEngine, FlagLock};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::{write_responses_csv, Outcome, RequestRecord, ResponseRecord};
use crate::store::{KvStore, MemoryStore, MemoryStoreOptions};
use crate::strategy::{ProcessingStrategy, ReplaySummary};
use crate::types::MeterError;
use futures::io::AsyncRead;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{error, info, warn};

/// Configuration for a replay run
#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Number of requests run concurrently per batch
    pub batch_size: usize,
    /// Worker threads of the tokio runtime
    pub worker_threads: usize,
    /// Simulated store round-trip time
    pub latency: Option<Duration>,
    pub meter: MeterConfig,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: 30,
            worker_threads: num_cpus::get(),
            latency: None,
            meter: MeterConfig::default(),
        }
    }
}

impl ReplayConfig {
    /// Create a ReplayConfig, falling back to defaults on zero values
    pub fn new(batch_size: usize, worker_threads: usize, meter: MeterConfig) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size,
                default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                "Invalid worker_threads ({}), using default ({})",
                worker_threads,
                default.worker_threads
            );
            default.worker_threads
        } else {
            worker_threads
        };

        Self {
            batch_size,
            worker_threads,
            latency: None,
            meter,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

/// Replays a request file through one lock strategy
#[derive(Debug, Clone)]
pub struct ReplayStrategy {
    lock: LockStrategyType,
    config: ReplayConfig,
}

impl ReplayStrategy {
    pub fn new(lock: LockStrategyType, config: ReplayConfig) -> Self {
        Self { lock, config }
    }

    fn store_options(&self) -> MemoryStoreOptions {
        // The flag lock runs over a store without atomic primitives, as it would in production.
        let options = match self.lock {
            LockStrategyType::Flag => MemoryStoreOptions::plain(),
            LockStrategyType::Atomic => MemoryStoreOptions::atomic(),
        };
        match self.config.latency {
            Some(latency) => options.with_latency(latency),
            None => options,
        }
    }

    async fn run<R>(
        &self,
        store: Arc<dyn KvStore>,
        reader: AsyncReader<R>,
    ) -> Result<Vec<ResponseRecord>, MeterError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let meter = &self.config.meter;
        let ledger = BalanceLedger::new(Arc::clone(&store), meter);
        let batch_size = self.config.batch_size;

        let responses = match self.lock {
            LockStrategyType::Flag => {
                let engine = ChargingEngine::new(FlagLock::new(store, meter), ledger, meter);
                info!(
                    lock = engine.lock().name(),
                    worst_case_wait = ?engine.lock().config().worst_case_wait(),
                    "starting replay"
                );
                replay(Arc::new(engine), reader, batch_size).await
            }
            LockStrategyType::Atomic => {
                let engine = ChargingEngine::new(AtomicLock::new(store, meter)?, ledger, meter);
                info!(
                    lock = engine.lock().name(),
                    worst_case_wait = ?engine.lock().config().worst_case_wait(),
                    "starting replay"
                );
                replay(Arc::new(engine), reader, batch_size).await
            }
        };

        Ok(responses)
    }
}

impl ProcessingStrategy for ReplayStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<ReplaySummary, MeterError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .enable_all()
            .build()?;

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path).await.map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    MeterError::FileNotFound {
                        path: input_path.display().to_string(),
                    }
                } else {
                    MeterError::from(e)
                }
            })?;

            // Wrap tokio file in a compatibility layer for csv-async
            let reader = AsyncReader::new(tokio_util::compat::TokioAsyncReadCompatExt::compat(file));

            let store: Arc<dyn KvStore> = Arc::new(MemoryStore::open(self.store_options()));
            let replayed = self.run(Arc::clone(&store), reader).await;
            store.close().await?;
            let responses = replayed?;

            write_responses_csv(&responses, output)?;

            let summary = ReplaySummary::from_responses(&responses);
            info!(?summary, "replay finished");
            Ok(summary)
        })
    }
}

async fn replay<L, R>(
    engine: Arc<ChargingEngine<L>>,
    mut reader: AsyncReader<R>,
    batch_size: usize,
) -> Vec<ResponseRecord>
where
    L: AccountLock + 'static,
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut responses = Vec::new();

    loop {
        let batch = reader.read_batch(batch_size).await;
        if batch.is_empty() {
            break;
        }

        let (rows, handles): (Vec<_>, Vec<_>) = batch
            .into_iter()
            .map(|request| {
                let row = (request.op(), request.account().to_string());
                let engine = Arc::clone(&engine);
                (row, tokio::spawn(async move { execute(&engine, request).await }))
            })
            .unzip();

        let joined = futures::future::join_all(handles).await;
        for ((op, account), result) in rows.into_iter().zip(joined) {
            responses.push(joined_response(op, account, result));
        }
    }

    responses
}

/// Keep one output row per input row, even when the request task died
fn joined_response(
    op: &'static str,
    account: String,
    joined: Result<ResponseRecord, JoinError>,
) -> ResponseRecord {
    match joined {
        Ok(response) => response,
        Err(e) => {
            error!(op, account = %account, error = %e, "request task failed");
            ResponseRecord {
                op,
                account,
                outcome: Outcome::Failed(MeterError::RequestAborted {
                    message: e.to_string(),
                }),
            }
        }
    }
}

/// Run one request and turn its result into an output row
pub async fn execute<L: AccountLock>(engine: &ChargingEngine<L>, request: RequestRecord) -> ResponseRecord {
    let op = request.op();
    let account = request.account().to_string();

    let outcome = match &request {
        RequestRecord::Charge(charge) => match engine.charge(charge).await {
            Ok(Some(result)) => Outcome::Charged(result),
            Ok(None) => Outcome::Ignored,
            Err(e) => Outcome::Failed(e),
        },
        RequestRecord::Reset(reset) => match engine.reset(reset).await {
            Ok(Some(result)) => Outcome::Reset(result),
            Ok(None) => Outcome::Ignored,
            Err(e) => Outcome::Failed(e),
        },
    };

    if let Outcome::Failed(e) = &outcome {
        error!(op, account = %account, error = %e, "request failed");
    }

    ResponseRecord { op, account, outcome }
}
