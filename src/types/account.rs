//! Account identity and store key derivation
//!
//! An account owns exactly two entries in the key-value store: its balance and
//! its lock flag. Both keys are derived from the account id alone.

use std::fmt;

/// Opaque account identifier
///
/// Never empty: an empty id is treated as a missing one at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap a raw id, rejecting the empty string
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(AccountId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Logical key holding the decimal-string balance
    pub fn balance_key(&self) -> String {
        format!("{}/balance", self.0)
    }

    /// Logical key holding the lock flag
    ///
    /// Namespaced under the balance key so the two never collide for any id.
    pub fn lock_key(&self) -> String {
        format!("{}/balance/locked", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_id_is_rejected() {
        assert!(AccountId::new("").is_none());
        assert!(AccountId::new("acct-1").is_some());
    }

    #[test]
    fn test_key_derivation() {
        let account = AccountId::new("acct-1").unwrap();

        assert_eq!(account.balance_key(), "acct-1/balance");
        assert_eq!(account.lock_key(), "acct-1/balance/locked");
    }

    #[test]
    fn test_keys_are_distinct_across_accounts() {
        // "a/balance" as an id must not produce another account's lock key
        let plain = AccountId::new("a").unwrap();
        let nested = AccountId::new("a/balance").unwrap();

        assert_ne!(plain.lock_key(), nested.balance_key());
        assert_ne!(plain.balance_key(), plain.lock_key());
    }
}
