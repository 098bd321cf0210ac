//! Read-only queries: account summary and catalog listing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use merchledger_shared::types::AccountId;

use super::error::LedgerError;
use super::store::{BalanceStore, UnitOfWork};
use super::types::{
    Account, AccountSummary, CatalogItem, CoinHistory, InventoryItem, PurchaseRecord,
    ReceivedCoins, SentCoins, TransferRecord,
};

/// Loads balance, inventory and coin history of one account from a single
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSummaryQuery {
    account_id: AccountId,
}

impl AccountSummaryQuery {
    /// Operation name used in logs and observer events.
    pub const OPERATION: &'static str = "account_summary";

    /// Creates the query.
    #[must_use]
    pub const fn new(account_id: AccountId) -> Self {
        Self { account_id }
    }
}

#[async_trait]
impl<S: BalanceStore + ?Sized> UnitOfWork<S> for AccountSummaryQuery {
    type Output = AccountSummary;

    fn name(&self) -> &'static str {
        Self::OPERATION
    }

    async fn execute(&self, store: &S) -> Result<AccountSummary, LedgerError> {
        let account = store
            .account(self.account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(self.account_id))?;
        let transfers = store.transfers_of(self.account_id).await?;
        let purchases = store.purchases_of(self.account_id).await?;

        Ok(summarize(&account, &transfers, &purchases))
    }
}

/// Lists every catalog item, cheapest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogQuery;

impl CatalogQuery {
    /// Operation name used in logs and observer events.
    pub const OPERATION: &'static str = "list_catalog";
}

#[async_trait]
impl<S: BalanceStore + ?Sized> UnitOfWork<S> for CatalogQuery {
    type Output = Vec<CatalogItem>;

    fn name(&self) -> &'static str {
        Self::OPERATION
    }

    async fn execute(&self, store: &S) -> Result<Vec<CatalogItem>, LedgerError> {
        Ok(store.catalog().await?)
    }
}

/// Builds the summary view of `account` from its history.
///
/// `transfers` and `purchases` are expected oldest first; that order is kept
/// in the coin history. Inventory is grouped by item name and sorted by it.
#[must_use]
pub fn summarize(
    account: &Account,
    transfers: &[TransferRecord],
    purchases: &[(PurchaseRecord, CatalogItem)],
) -> AccountSummary {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for (_, item) in purchases {
        *counts.entry(item.name.as_str()).or_default() += 1;
    }
    let inventory = counts
        .into_iter()
        .map(|(name, quantity)| InventoryItem {
            name: name.to_string(),
            quantity,
        })
        .collect();

    let mut coin_history = CoinHistory::default();
    for transfer in transfers {
        if transfer.receiver_id == account.id {
            coin_history.received.push(ReceivedCoins {
                from: transfer.sender_id,
                amount: transfer.amount,
                at: transfer.created_at,
            });
        }
        if transfer.sender_id == account.id {
            coin_history.sent.push(SentCoins {
                to: transfer.receiver_id,
                amount: transfer.amount,
                at: transfer.created_at,
            });
        }
    }

    AccountSummary {
        account_id: account.id,
        balance: account.balance,
        inventory,
        coin_history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use merchledger_shared::types::{CatalogItemId, PurchaseId, TransferId};

    fn item(name: &str, price: i64) -> CatalogItem {
        CatalogItem {
            id: CatalogItemId::new(),
            name: name.to_string(),
            price,
        }
    }

    fn purchase(account_id: AccountId, item: &CatalogItem) -> (PurchaseRecord, CatalogItem) {
        (
            PurchaseRecord {
                id: PurchaseId::new(),
                account_id,
                item_id: item.id,
                created_at: Utc::now(),
            },
            item.clone(),
        )
    }

    #[test]
    fn test_inventory_grouped_and_sorted() {
        let account = Account {
            id: AccountId::new(),
            balance: 870,
            created_at: Utc::now(),
        };
        let cup = item("cup", 20);
        let pen = item("pen", 10);
        let book = item("book", 50);
        let purchases = vec![
            purchase(account.id, &pen),
            purchase(account.id, &cup),
            purchase(account.id, &book),
            purchase(account.id, &cup),
        ];

        let summary = summarize(&account, &[], &purchases);

        let lines: Vec<(&str, u32)> = summary
            .inventory
            .iter()
            .map(|i| (i.name.as_str(), i.quantity))
            .collect();
        assert_eq!(lines, vec![("book", 1), ("cup", 2), ("pen", 1)]);
        assert_eq!(summary.balance, 870);
        assert!(summary.coin_history.received.is_empty());
    }

    #[test]
    fn test_coin_history_split_by_direction() {
        let me = AccountId::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        let t0 = Utc::now();
        let transfers = vec![
            TransferRecord {
                id: TransferId::new(),
                sender_id: alice,
                receiver_id: me,
                amount: 50,
                created_at: t0,
            },
            TransferRecord {
                id: TransferId::new(),
                sender_id: me,
                receiver_id: bob,
                amount: 20,
                created_at: t0 + Duration::seconds(1),
            },
            TransferRecord {
                id: TransferId::new(),
                sender_id: bob,
                receiver_id: me,
                amount: 5,
                created_at: t0 + Duration::seconds(2),
            },
        ];
        let account = Account {
            id: me,
            balance: 1035,
            created_at: t0,
        };

        let summary = summarize(&account, &transfers, &[]);

        let received: Vec<(AccountId, i64)> = summary
            .coin_history
            .received
            .iter()
            .map(|r| (r.from, r.amount))
            .collect();
        assert_eq!(received, vec![(alice, 50), (bob, 5)]);
        assert_eq!(summary.coin_history.sent.len(), 1);
        assert_eq!(summary.coin_history.sent[0].to, bob);
        assert_eq!(summary.coin_history.sent[0].amount, 20);
        assert!(summary.inventory.is_empty());
    }
}
