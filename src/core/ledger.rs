//! Balance ledger
//!
//! Reads and writes an account's balance as a decimal string under
//! `{accountId}/balance`. There is no validation and no concurrency control here:
//! a read-modify-write is only safe inside an [`AccountLock`](crate::core::AccountLock)
//! critical section.

use crate::config::MeterConfig;
use crate::store::{KeyEncoding, KvStore};
use crate::types::{AccountId, MeterError};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Balance access for every account in one store
#[derive(Clone)]
pub struct BalanceLedger {
    store: Arc<dyn KvStore>,
    ttl: Duration,
    encoding: KeyEncoding,
}

impl BalanceLedger {
    pub fn new(store: Arc<dyn KvStore>, config: &MeterConfig) -> Self {
        Self {
            store,
            ttl: config.ttl,
            encoding: config.key_encoding,
        }
    }

    fn key(&self, account: &AccountId) -> String {
        self.encoding.encode(&account.balance_key())
    }

    /// Current balance; absent or unparsable values read as zero
    pub async fn get_balance(&self, account: &AccountId) -> Result<Decimal, MeterError> {
        let Some(entry) = self.store.read(&self.key(account)).await? else {
            return Ok(Decimal::ZERO);
        };

        match Decimal::from_str(entry.value.trim()) {
            Ok(balance) => Ok(balance),
            Err(_) => {
                warn!(account = %account, value = %entry.value, "unparsable balance, reading as zero");
                Ok(Decimal::ZERO)
            }
        }
    }

    /// Overwrite the balance and restart its TTL
    pub async fn set_balance(&self, account: &AccountId, balance: Decimal) -> Result<(), MeterError> {
        self.store
            .write(&self.key(account), &balance.to_string(), self.ttl)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, MemoryStoreOptions};
    use rstest::rstest;

    fn account() -> AccountId {
        AccountId::new("acct").unwrap()
    }

    fn ledger_with(encoding: KeyEncoding) -> (Arc<dyn KvStore>, BalanceLedger) {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::open(MemoryStoreOptions::plain()));
        let config = MeterConfig {
            key_encoding: encoding,
            ..MeterConfig::default()
        };
        (Arc::clone(&store), BalanceLedger::new(store, &config))
    }

    #[tokio::test]
    async fn test_absent_balance_reads_as_zero() {
        let (_, ledger) = ledger_with(KeyEncoding::Plain);

        assert_eq!(ledger.get_balance(&account()).await, Ok(Decimal::ZERO));
    }

    #[rstest]
    #[case::integer(Decimal::from(10_000))]
    #[case::zero(Decimal::ZERO)]
    #[case::fractional(Decimal::new(12345, 2))]
    #[case::negative(Decimal::from(-3))]
    #[tokio::test]
    async fn test_set_then_get(#[case] balance: Decimal) {
        let (_, ledger) = ledger_with(KeyEncoding::Plain);

        ledger.set_balance(&account(), balance).await.unwrap();

        assert_eq!(ledger.get_balance(&account()).await, Ok(balance));
    }

    #[rstest]
    #[case::garbage("not-a-number")]
    #[case::empty("")]
    #[tokio::test]
    async fn test_unparsable_balance_reads_as_zero(#[case] raw: &str) {
        let (store, ledger) = ledger_with(KeyEncoding::Plain);
        store
            .write("acct/balance", raw, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(ledger.get_balance(&account()).await, Ok(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_balance_stored_as_decimal_string() {
        let (store, ledger) = ledger_with(KeyEncoding::Plain);

        ledger
            .set_balance(&account(), Decimal::from(9995))
            .await
            .unwrap();

        let raw = store.read("acct/balance").await.unwrap().unwrap();
        assert_eq!(raw.value, "9995");
    }

    #[tokio::test]
    async fn test_base64_encoded_keys() {
        let (store, ledger) = ledger_with(KeyEncoding::Base64);

        ledger.set_balance(&account(), Decimal::from(7)).await.unwrap();

        assert!(store.read("acct/balance").await.unwrap().is_none());
        assert!(store.read("YWNjdC9iYWxhbmNl").await.unwrap().is_some());
        assert_eq!(ledger.get_balance(&account()).await, Ok(Decimal::from(7)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let (store, ledger) = ledger_with(KeyEncoding::Plain);
        store.close().await.unwrap();

        assert!(matches!(
            ledger.get_balance(&account()).await,
            Err(MeterError::StoreUnavailable { .. })
        ));
        assert!(matches!(
            ledger.set_balance(&account(), Decimal::ONE).await,
            Err(MeterError::StoreUnavailable { .. })
        ));
    }
}
