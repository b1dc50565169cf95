//! Wallet capability interface.
//!
//! The wallet is an external collaborator. The engine only ever calls it
//! after `reward_eligible` has been sealed, and only when the
//! idempotency marker is unset; the wallet owns its own retry policy.

use std::sync::Mutex;

use thiserror::Error;

/// Wallet failure.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The wallet backend could not be reached.
    #[error("wallet unavailable: {reason}")]
    Unavailable {
        /// Backend error text.
        reason: String,
    },

    /// The credit was rejected for the account.
    #[error("credit rejected for {user_id}: {reason}")]
    CreditRejected {
        /// The account that was not credited.
        user_id: String,
        /// Rejection reason.
        reason: String,
    },
}

/// Record of one balance credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Wallet-side transaction id.
    pub transaction_id: String,
    /// Credited account.
    pub user_id: String,
    /// Credited amount.
    pub amount: u64,
}

/// Earned-balance crediting.
pub trait Wallet {
    /// Credits `amount` to `user_id`'s earned balance.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] when the credit cannot be performed; the
    /// engine treats this as fail-fast and leaves the claim unmarked.
    fn credit_earned_balance(
        &self,
        user_id: &str,
        amount: u64,
    ) -> Result<TransactionRecord, WalletError>;
}

/// In-memory wallet that records every credit, for tests.
#[derive(Debug, Default)]
pub struct RecordingWallet {
    credits: Mutex<Vec<TransactionRecord>>,
}

impl RecordingWallet {
    /// Creates an empty recording wallet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every credit performed so far.
    #[must_use]
    pub fn credits(&self) -> Vec<TransactionRecord> {
        self.credits.lock().unwrap().clone()
    }
}

impl Wallet for RecordingWallet {
    fn credit_earned_balance(
        &self,
        user_id: &str,
        amount: u64,
    ) -> Result<TransactionRecord, WalletError> {
        let mut credits = self.credits.lock().unwrap();
        let record = TransactionRecord {
            transaction_id: format!("txn-{}", credits.len() + 1),
            user_id: user_id.to_string(),
            amount,
        };
        credits.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_recording_wallet_tracks_credits() {
        let wallet = RecordingWallet::new();
        let record = wallet.credit_earned_balance("user-1", 1).unwrap();
        assert_eq!(record.transaction_id, "txn-1");
        assert_eq!(record.amount, 1);
        assert_eq!(wallet.credits().len(), 1);
    }
}
