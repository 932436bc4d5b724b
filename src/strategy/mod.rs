//! Processing strategy module for request replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! covering CSV parsing, request execution and response output. The lock
//! strategy protecting each account is selected at runtime.

use crate::cli::LockStrategyType;
use crate::io::csv_format::{Outcome, ResponseRecord};
use crate::types::MeterError;
use std::io::Write;
use std::path::Path;

pub mod replay;

pub use replay::{ReplayConfig, ReplayStrategy};

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay requests from the input file and write one response row per request
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened
    /// - The configured lock cannot run over the store
    /// - Output cannot be written
    ///
    /// Failures of individual requests are reported in their response rows and
    /// do not stop the replay.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<ReplaySummary, MeterError>;
}

/// Counts of what a replay did
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplaySummary {
    pub requests: usize,
    pub authorized: usize,
    pub declined: usize,
    pub resets: usize,
    pub ignored: usize,
    pub failed: usize,
    /// Average computation time of charges that got a result, lock wait included
    pub mean_computation_ms: f64,
}

impl ReplaySummary {
    pub fn from_responses(responses: &[ResponseRecord]) -> Self {
        let mut summary = Self {
            requests: responses.len(),
            ..Self::default()
        };

        let mut charge_micros: u128 = 0;

        for response in responses {
            if let Outcome::Charged(result) = &response.outcome {
                charge_micros += result.computation_time.as_micros();
            }

            match &response.outcome {
                Outcome::Charged(result) if result.authorized => summary.authorized += 1,
                Outcome::Charged(_) => summary.declined += 1,
                Outcome::Reset(_) => summary.resets += 1,
                Outcome::Ignored => summary.ignored += 1,
                Outcome::Failed(_) => summary.failed += 1,
            }
        }

        let charges = summary.authorized + summary.declined;
        if charges > 0 {
            summary.mean_computation_ms = charge_micros as f64 / charges as f64 / 1000.0;
        }

        summary
    }
}

/// Create a replay strategy for the given lock type
pub fn create_strategy(lock: LockStrategyType, config: ReplayConfig) -> Box<dyn ProcessingStrategy> {
    Box::new(ReplayStrategy::new(lock, config))
}
