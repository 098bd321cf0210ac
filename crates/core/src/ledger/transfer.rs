//! Coin transfer between two accounts.

use async_trait::async_trait;
use chrono::Utc;
use merchledger_shared::types::AccountId;

use super::error::{LedgerError, StoreError};
use super::store::{BalanceStore, UnitOfWork};
use super::types::{Coins, NewTransfer, TransferRecord};

/// Moves `amount` coins from `sender_id` to `receiver_id`.
///
/// Construction validates the request without touching the store, so a
/// malformed request never opens a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCoins {
    sender_id: AccountId,
    receiver_id: AccountId,
    amount: Coins,
}

impl TransferCoins {
    /// Operation name used in logs and observer events.
    pub const OPERATION: &'static str = "transfer_coins";

    /// Validates and builds a transfer command.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is zero or negative
    /// - `SelfTransfer` if sender and receiver are the same account
    pub fn new(
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Coins,
    ) -> Result<Self, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if sender_id == receiver_id {
            return Err(LedgerError::SelfTransfer);
        }
        Ok(Self {
            sender_id,
            receiver_id,
            amount,
        })
    }

    /// The paying account.
    #[must_use]
    pub const fn sender_id(&self) -> AccountId {
        self.sender_id
    }

    /// The receiving account.
    #[must_use]
    pub const fn receiver_id(&self) -> AccountId {
        self.receiver_id
    }

    /// The amount to move.
    #[must_use]
    pub const fn amount(&self) -> Coins {
        self.amount
    }
}

#[async_trait]
impl<S: BalanceStore + ?Sized> UnitOfWork<S> for TransferCoins {
    type Output = TransferRecord;

    fn name(&self) -> &'static str {
        Self::OPERATION
    }

    async fn execute(&self, store: &S) -> Result<TransferRecord, LedgerError> {
        let sender_balance = store
            .balance(self.sender_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(self.sender_id))?;

        if sender_balance < self.amount {
            return Err(LedgerError::InsufficientFunds {
                account_id: self.sender_id,
                balance: sender_balance,
                required: self.amount,
            });
        }

        let receiver_balance = store
            .balance(self.receiver_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(self.receiver_id))?;

        let receiver_after = receiver_balance
            .checked_add(self.amount)
            .ok_or_else(|| StoreError::new("receiver balance overflow"))?;

        store
            .set_balance(self.sender_id, sender_balance - self.amount)
            .await?;
        store.set_balance(self.receiver_id, receiver_after).await?;

        let record = store
            .append_transfer(NewTransfer {
                sender_id: self.sender_id,
                receiver_id: self.receiver_id,
                amount: self.amount,
                created_at: Utc::now(),
            })
            .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(Coins::MIN)]
    fn test_non_positive_amount_rejected(#[case] amount: Coins) {
        let result = TransferCoins::new(AccountId::new(), AccountId::new(), amount);
        assert!(matches!(result, Err(LedgerError::InvalidAmount(a)) if a == amount));
    }

    #[test]
    fn test_self_transfer_rejected() {
        let id = AccountId::new();
        assert!(matches!(
            TransferCoins::new(id, id, 10),
            Err(LedgerError::SelfTransfer)
        ));
    }

    #[test]
    fn test_amount_checked_before_self_transfer() {
        let id = AccountId::new();
        assert!(matches!(
            TransferCoins::new(id, id, 0),
            Err(LedgerError::InvalidAmount(0))
        ));
    }

    #[test]
    fn test_valid_transfer_keeps_fields() {
        let (a, b) = (AccountId::new(), AccountId::new());
        let cmd = TransferCoins::new(a, b, 30).unwrap();
        assert_eq!(cmd.sender_id(), a);
        assert_eq!(cmd.receiver_id(), b);
        assert_eq!(cmd.amount(), 30);
    }
}
