//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account identity and key derivation
//! - `service`: Service types and the charge-amount table
//! - `request`: Boundary request/result shapes
//! - `error`: Error types for the charging engine

pub mod account;
pub mod error;
pub mod request;
pub mod service;

pub use account::AccountId;
pub use error::MeterError;
pub use request::{ChargeRequest, ChargeResult, ResetRequest, ResetResult};
pub use service::{ChargeTable, ServiceType};
