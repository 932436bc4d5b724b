//! Service types and the charge-amount table

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of usage event being charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Voice,
    Message,
    Data,
}

impl FromStr for ServiceType {
    type Err = String;

    /// Exact, lowercase match only
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "voice" => Ok(ServiceType::Voice),
            "message" => Ok(ServiceType::Message),
            "data" => Ok(ServiceType::Data),
            other => Err(format!("unknown service type '{}'", other)),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceType::Voice => "voice",
            ServiceType::Message => "message",
            ServiceType::Data => "data",
        };
        f.write_str(name)
    }
}

/// Charge amount per service type, in credits
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeTable {
    pub voice: Decimal,
    pub message: Decimal,
    pub data: Decimal,
}

impl ChargeTable {
    pub fn amount_for(&self, service: ServiceType) -> Decimal {
        match service {
            ServiceType::Voice => self.voice,
            ServiceType::Message => self.message,
            ServiceType::Data => self.data,
        }
    }
}

impl Default for ChargeTable {
    fn default() -> Self {
        Self {
            voice: Decimal::from(5),
            message: Decimal::from(1),
            data: Decimal::from(2),
        }
    }
}
