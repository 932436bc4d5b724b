//! Charging engine
//!
//! This module provides the ChargingEngine that orchestrates the two ledger
//! operations by running each one inside an account's lock:
//!
//! - **charge**: debit the service's amount if the balance covers it
//! - **reset**: restore the configured default balance
//!
//! Requests with a missing or invalid field are ignored (`Ok(None)`), with no
//! store access at all.

use crate::config::MeterConfig;
use crate::core::ledger::BalanceLedger;
use crate::core::traits::AccountLock;
use crate::types::{ChargeRequest, ChargeResult, ChargeTable, MeterError, ResetRequest, ResetResult};
use rust_decimal::Decimal;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Ledger operations over one lock strategy
pub struct ChargingEngine<L: AccountLock> {
    lock: L,
    ledger: BalanceLedger,
    charges: ChargeTable,
    default_balance: Decimal,
}

impl<L: AccountLock> ChargingEngine<L> {
    pub fn new(lock: L, ledger: BalanceLedger, config: &MeterConfig) -> Self {
        Self {
            lock,
            ledger,
            charges: config.charges.clone(),
            default_balance: config.default_balance,
        }
    }

    pub fn lock(&self) -> &L {
        &self.lock
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    /// Authorize and apply one charge
    ///
    /// # Returns
    ///
    /// * `Ok(None)` if the request is malformed and was ignored
    /// * `Ok(Some(result))` with `authorized: false` if the balance does not cover
    ///   the charge, or if writing the debited balance failed
    /// * `Err(MeterError)` on lock exhaustion, a stuck lock, or a failed balance read
    pub async fn charge(&self, request: &ChargeRequest) -> Result<Option<ChargeResult>, MeterError> {
        let Some((account, service)) = request.validate() else {
            debug!(?request, "ignoring malformed charge request");
            return Ok(None);
        };

        let started = Instant::now();
        let amount = self.charges.amount_for(service);
        let ledger = &self.ledger;
        let account_ref = &account;

        let mut result = self
            .lock
            .with_lock(account_ref, move || async move {
                let balance = ledger.get_balance(account_ref).await?;
                if amount > balance {
                    return Ok(ChargeResult::declined(balance));
                }

                let remaining = balance - amount;
                if let Err(e) = ledger.set_balance(account_ref, remaining).await {
                    // Not retried here; reported as an unauthorized charge.
                    error!(account = %account_ref, error = %e, "balance write failed, charge declined");
                    return Ok(ChargeResult::declined(balance));
                }

                Ok(ChargeResult {
                    remaining_balance: remaining,
                    charges: amount,
                    authorized: true,
                    computation_time: Duration::ZERO,
                })
            })
            .await?;

        result.computation_time = started.elapsed();
        debug!(
            account = %account,
            %service,
            authorized = result.authorized,
            remaining = %result.remaining_balance,
            "charge processed"
        );

        Ok(Some(result))
    }

    /// Restore the default balance and report what the store now holds
    pub async fn reset(&self, request: &ResetRequest) -> Result<Option<ResetResult>, MeterError> {
        let Some(account) = request.validate() else {
            debug!(?request, "ignoring malformed reset request");
            return Ok(None);
        };

        let ledger = &self.ledger;
        let account_ref = &account;
        let default_balance = self.default_balance;

        let balance = self
            .lock
            .with_lock(account_ref, move || async move {
                ledger.set_balance(account_ref, default_balance).await?;
                ledger.get_balance(account_ref).await
            })
            .await?;

        debug!(account = %account, %balance, "balance reset");
        Ok(Some(ResetResult { balance }))
    }
}
