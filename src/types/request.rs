//! Request and result shapes at the service boundary
//!
//! Requests keep every field optional: a request with a missing or invalid field
//! is not rejected with an error, it is silently ignored by the engine. This
//! permissive contract is inherited and is a known design risk, since a caller
//! cannot tell "ignored" from "dropped".

use super::account::AccountId;
use super::service::ServiceType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Charge request: `{accountId, serviceType}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
}

impl ChargeRequest {
    pub fn new(account_id: &str, service_type: &str) -> Self {
        Self {
            account_id: Some(account_id.to_string()),
            service_type: Some(service_type.to_string()),
        }
    }

    /// Both fields parsed, or `None` when the request must be ignored
    pub fn validate(&self) -> Option<(AccountId, ServiceType)> {
        let account = AccountId::new(self.account_id.clone()?)?;
        let service = self.service_type.as_deref()?.parse().ok()?;
        Some((account, service))
    }
}

/// Reset request: `{accountId}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    #[serde(default)]
    pub account_id: Option<String>,
}

impl ResetRequest {
    pub fn new(account_id: &str) -> Self {
        Self {
            account_id: Some(account_id.to_string()),
        }
    }

    pub fn validate(&self) -> Option<AccountId> {
        AccountId::new(self.account_id.clone()?)
    }
}

/// Outcome of a charge
///
/// `charges` is the amount actually debited: zero whenever `authorized` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResult {
    pub remaining_balance: Decimal,
    pub charges: Decimal,
    pub authorized: bool,
    /// Wall time of the whole operation including lock wait; observability only
    #[serde(with = "duration_ms")]
    pub computation_time: Duration,
}

impl ChargeResult {
    /// A declined charge leaves the balance where it was
    pub fn declined(balance: Decimal) -> Self {
        Self {
            remaining_balance: balance,
            charges: Decimal::ZERO,
            authorized: false,
            computation_time: Duration::ZERO,
        }
    }
}

/// Outcome of a reset: the balance read back after writing the default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetResult {
    pub balance: Decimal,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
