//! Charging Engine CLI
//!
//! Replays charge and reset requests from a CSV file against an in-memory
//! balance meter and writes one response row per request to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- requests.csv > responses.csv
//! cargo run -- --lock flag --latency-ms 2 requests.csv > responses.csv
//! cargo run -- --lock atomic --batch-size 50 --worker-threads 8 requests.csv > responses.csv
//! RUST_LOG=rust_charging_engine=debug cargo run -- requests.csv > responses.csv
//! ```
//!
//! # Lock Strategies
//!
//! - **atomic**: create-if-absent / compare-and-swap lock (default)
//! - **flag**: best-effort check-then-set flag, kept as a baseline
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, unsupported store, etc.)

use rust_charging_engine::cli;
use rust_charging_engine::strategy;
use std::process;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    init_logging();

    let args = cli::parse_args();
    let strategy = strategy::create_strategy(args.lock, args.to_replay_config());

    // Responses go to stdout, logs to stderr
    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!(error = %e, "replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "charging_engine=info,rust_charging_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
