//! Buying a catalog item with coins.

use async_trait::async_trait;
use chrono::Utc;
use merchledger_shared::types::AccountId;

use super::error::LedgerError;
use super::store::{BalanceStore, UnitOfWork};
use super::types::{CatalogItem, NewPurchase, PurchaseRecord};

/// A committed purchase together with the item bought.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPurchase {
    /// The appended history record.
    pub record: PurchaseRecord,
    /// The item as priced at purchase time.
    pub item: CatalogItem,
}

/// Debits the item price from the account and records the purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseMerch {
    account_id: AccountId,
    item_name: String,
}

impl PurchaseMerch {
    /// Operation name used in logs and observer events.
    pub const OPERATION: &'static str = "purchase_merch";

    /// Builds a purchase command. Surrounding whitespace in the name is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if the name is empty after trimming.
    pub fn new(account_id: AccountId, item_name: &str) -> Result<Self, LedgerError> {
        let item_name = item_name.trim();
        if item_name.is_empty() {
            return Err(LedgerError::ItemNotFound(String::new()));
        }
        Ok(Self {
            account_id,
            item_name: item_name.to_string(),
        })
    }

    /// The buying account.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// The requested item name, trimmed.
    #[must_use]
    pub fn item_name(&self) -> &str {
        &self.item_name
    }
}

#[async_trait]
impl<S: BalanceStore + ?Sized> UnitOfWork<S> for PurchaseMerch {
    type Output = CompletedPurchase;

    fn name(&self) -> &'static str {
        Self::OPERATION
    }

    async fn execute(&self, store: &S) -> Result<CompletedPurchase, LedgerError> {
        let item = store
            .item_by_name(&self.item_name)
            .await?
            .ok_or_else(|| LedgerError::ItemNotFound(self.item_name.clone()))?;

        let balance = store
            .balance(self.account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(self.account_id))?;

        if balance < item.price {
            return Err(LedgerError::InsufficientFunds {
                account_id: self.account_id,
                balance,
                required: item.price,
            });
        }

        store
            .set_balance(self.account_id, balance - item.price)
            .await?;

        let record = store
            .append_purchase(NewPurchase {
                account_id: self.account_id,
                item_id: item.id,
                created_at: Utc::now(),
            })
            .await?;

        Ok(CompletedPurchase { record, item })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trimmed() {
        let cmd = PurchaseMerch::new(AccountId::new(), "  cup \n").unwrap();
        assert_eq!(cmd.item_name(), "cup");
    }

    #[test]
    fn test_blank_name_is_not_found() {
        assert!(matches!(
            PurchaseMerch::new(AccountId::new(), "   "),
            Err(LedgerError::ItemNotFound(name)) if name.is_empty()
        ));
    }
}
