//! Error types for the charging engine
//!
//! This module defines the errors surfaced by the lock manager, the ledger and the
//! replay pipeline. Malformed requests and unauthorized charges are not errors:
//! the former are ignored, the latter are a normal `authorized: false` result.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: input file missing, unreadable, output not writable
//! - **CSV Errors**: malformed rows in a replay file, output serialization
//! - **Lock Errors**: retry budget exhausted, or the lock flag could not be cleared
//! - **Store Errors**: a key-value operation failed or the backend lacks a primitive

use crate::store::StoreError;
use thiserror::Error;

/// Main error type for the charging engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeterError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing or serialization error
    #[error("CSV error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the error
        message: String,
    },

    /// The best-effort flag stayed set for the whole polling budget
    ///
    /// Nothing ran and the balance is untouched.
    #[error("Lock wait timed out for account {account} after {polls} polls")]
    LockTimeout {
        /// Account whose lock was never observed free
        account: String,
        /// Number of failed polls
        polls: u32,
    },

    /// The atomic acquire lost every race within its attempt budget
    ///
    /// Nothing ran and the balance is untouched.
    #[error("Lock contention on account {account}: not acquired after {attempts} attempts")]
    LockContention {
        /// Account whose lock could not be acquired
        account: String,
        /// Number of acquire attempts made
        attempts: u32,
    },

    /// The critical section ran but the lock flag could not be cleared
    ///
    /// The account stays locked until the lock entry's TTL expires.
    #[error("Failed to release lock for account {account} (locked until TTL expiry): {message}")]
    LockRelease {
        /// Account left locked
        account: String,
        /// Description of the store failure
        message: String,
    },

    /// A key-value store operation failed
    #[error("Store unavailable during {operation}: {message}")]
    StoreUnavailable {
        /// Store operation that failed
        operation: String,
        /// Description of the failure
        message: String,
    },

    /// The store backend lacks a primitive the caller requires
    #[error("Store backend does not support {operation}")]
    UnsupportedBackend {
        /// The missing primitive
        operation: String,
    },

    /// The task running a replayed request panicked or was cancelled
    #[error("Request aborted: {message}")]
    RequestAborted {
        /// Description of the join failure
        message: String,
    },
}

impl From<std::io::Error> for MeterError {
    fn from(error: std::io::Error) -> Self {
        MeterError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for MeterError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        MeterError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<StoreError> for MeterError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unsupported { operation } => MeterError::UnsupportedBackend {
                operation: operation.to_string(),
            },
            StoreError::Closed { operation } => MeterError::StoreUnavailable {
                operation: operation.to_string(),
                message: "store client is closed".to_string(),
            },
            StoreError::Unavailable { operation, message } => MeterError::StoreUnavailable {
                operation: operation.to_string(),
                message,
            },
        }
    }
}

impl MeterError {
    /// Create a LockTimeout error
    pub fn lock_timeout(account: &str, polls: u32) -> Self {
        MeterError::LockTimeout {
            account: account.to_string(),
            polls,
        }
    }

    /// Create a LockContention error
    pub fn lock_contention(account: &str, attempts: u32) -> Self {
        MeterError::LockContention {
            account: account.to_string(),
            attempts,
        }
    }

    /// Create a LockRelease error from the store failure that caused it
    pub fn lock_release(account: &str, cause: &StoreError) -> Self {
        MeterError::LockRelease {
            account: account.to_string(),
            message: cause.to_string(),
        }
    }

    /// True for the two "retry budget exhausted" errors
    pub fn is_lock_exhausted(&self) -> bool {
        matches!(
            self,
            MeterError::LockTimeout { .. } | MeterError::LockContention { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::file_not_found(
        MeterError::FileNotFound { path: "requests.csv".to_string() },
        "File not found: requests.csv"
    )]
    #[case::parse_error_with_line(
        MeterError::ParseError { line: Some(7), message: "bad row".to_string() },
        "CSV error at line 7: bad row"
    )]
    #[case::parse_error_without_line(
        MeterError::ParseError { line: None, message: "bad row".to_string() },
        "CSV error: bad row"
    )]
    #[case::lock_timeout(
        MeterError::lock_timeout("alice", 10),
        "Lock wait timed out for account alice after 10 polls"
    )]
    #[case::lock_contention(
        MeterError::lock_contention("bob", 100),
        "Lock contention on account bob: not acquired after 100 attempts"
    )]
    #[case::unsupported(
        MeterError::UnsupportedBackend { operation: "cas_write".to_string() },
        "Store backend does not support cas_write"
    )]
    #[case::request_aborted(
        MeterError::RequestAborted { message: "task panicked".to_string() },
        "Request aborted: task panicked"
    )]
    fn test_error_display(#[case] error: MeterError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::unavailable(
        StoreError::Unavailable { operation: "write", message: "connection reset".to_string() },
        MeterError::StoreUnavailable { operation: "write".to_string(), message: "connection reset".to_string() }
    )]
    #[case::closed(
        StoreError::Closed { operation: "read" },
        MeterError::StoreUnavailable { operation: "read".to_string(), message: "store client is closed".to_string() }
    )]
    #[case::unsupported(
        StoreError::Unsupported { operation: "try_acquire" },
        MeterError::UnsupportedBackend { operation: "try_acquire".to_string() }
    )]
    fn test_store_error_conversion(#[case] source: StoreError, #[case] expected: MeterError) {
        assert_eq!(MeterError::from(source), expected);
    }

    #[test]
    fn test_lock_release_keeps_cause() {
        let cause = StoreError::Unavailable {
            operation: "write",
            message: "timeout".to_string(),
        };
        let error = MeterError::lock_release("carol", &cause);

        assert!(matches!(error, MeterError::LockRelease { ref account, .. } if account == "carol"));
        assert!(error.to_string().contains("timeout"));
        assert!(!error.is_lock_exhausted());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: MeterError = io_error.into();
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}
