//! CSV format handling for replayed requests and their responses
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to boundary requests
//! - Response serialization
//!
//! All functions are pure (no I/O beyond the given writer) for easy testing.

use crate::types::{ChargeRequest, ChargeResult, MeterError, ResetRequest, ResetResult};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: op, account, service.
/// Both account and service may be empty; such requests are passed through
/// unchanged so that the engine can ignore them.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub op: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

/// A request read from a replay file
#[derive(Debug, Clone, PartialEq)]
pub enum RequestRecord {
    Charge(ChargeRequest),
    Reset(ResetRequest),
}

impl RequestRecord {
    pub fn op(&self) -> &'static str {
        match self {
            RequestRecord::Charge(_) => "charge",
            RequestRecord::Reset(_) => "reset",
        }
    }

    pub fn account(&self) -> &str {
        let account = match self {
            RequestRecord::Charge(request) => &request.account_id,
            RequestRecord::Reset(request) => &request.account_id,
        };
        account.as_deref().unwrap_or_default()
    }
}

/// Convert a CsvRecord to a RequestRecord
///
/// Only the operation name is validated here; an unknown operation is the one
/// row-level error a replay file can contain.
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<RequestRecord, String> {
    match csv_record.op.to_lowercase().as_str() {
        "charge" => Ok(RequestRecord::Charge(ChargeRequest {
            account_id: csv_record.account,
            service_type: csv_record.service,
        })),
        "reset" => Ok(RequestRecord::Reset(ResetRequest {
            account_id: csv_record.account,
        })),
        _ => Err(format!("Invalid operation: '{}'", csv_record.op)),
    }
}

/// What happened to one replayed request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Charged(ChargeResult),
    Reset(ResetResult),
    /// Malformed request, silently dropped by the engine
    Ignored,
    Failed(MeterError),
}

/// One output row
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    pub op: &'static str,
    pub account: String,
    pub outcome: Outcome,
}

/// Write responses to CSV format
///
/// Columns: op, account, outcome, authorized, charges, balance, computation_ms.
/// Rows keep the order of the given slice.
pub fn write_responses_csv(
    responses: &[ResponseRecord],
    output: &mut dyn Write,
) -> Result<(), MeterError> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer.write_record([
        "op",
        "account",
        "outcome",
        "authorized",
        "charges",
        "balance",
        "computation_ms",
    ])?;

    for response in responses {
        let (outcome, authorized, charges, balance, computation_ms) = match &response.outcome {
            Outcome::Charged(result) => (
                "ok".to_string(),
                result.authorized.to_string(),
                result.charges.to_string(),
                result.remaining_balance.to_string(),
                result.computation_time.as_millis().to_string(),
            ),
            Outcome::Reset(result) => (
                "ok".to_string(),
                String::new(),
                String::new(),
                result.balance.to_string(),
                String::new(),
            ),
            Outcome::Ignored => (
                "ignored".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ),
            Outcome::Failed(error) => (
                format!("error: {}", error),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ),
        };

        writer.write_record(&[
            response.op.to_string(),
            response.account.clone(),
            outcome,
            authorized,
            charges,
            balance,
            computation_ms,
        ])?;
    }

    writer.flush()?;

    Ok(())
}
