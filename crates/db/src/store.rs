//! PostgreSQL implementation of the ledger store contracts.
//!
//! Every scope wraps one `DatabaseTransaction` opened with the requested
//! isolation level and access mode. Reads are plain selects; serializable
//! isolation, not row locks, keeps concurrent transfers consistent.

use async_trait::async_trait;
use chrono::Utc;
use merchledger_core::ledger::{
    AccessMode, Account, BalanceStore, CatalogItem, Coins, ConflictClassifier, IsolationLevel,
    NewPurchase, NewTransfer, PurchaseRecord, StoreError, TransactionCoordinator, TransferRecord,
    TxOptions,
};
use merchledger_shared::types::{AccountId, PurchaseId, TransferId};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::debug;

use crate::conflict::{is_serialization_failure, store_error};
use crate::entities::{accounts, catalog_items, purchases, transfers};

const fn isolation(level: IsolationLevel) -> sea_orm::IsolationLevel {
    match level {
        IsolationLevel::ReadCommitted => sea_orm::IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead => sea_orm::IsolationLevel::RepeatableRead,
        IsolationLevel::Serializable => sea_orm::IsolationLevel::Serializable,
    }
}

const fn access(mode: AccessMode) -> sea_orm::AccessMode {
    match mode {
        AccessMode::ReadWrite => sea_orm::AccessMode::ReadWrite,
        AccessMode::ReadOnly => sea_orm::AccessMode::ReadOnly,
    }
}

/// Transaction coordinator over a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct PgCoordinator {
    db: DatabaseConnection,
}

impl PgCoordinator {
    /// Creates a coordinator over the given pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl ConflictClassifier for PgCoordinator {
    fn is_conflict(&self, err: &StoreError) -> bool {
        is_serialization_failure(err)
    }
}

#[async_trait]
impl TransactionCoordinator for PgCoordinator {
    type Scope = PgScope;

    async fn begin(&self, options: TxOptions) -> Result<PgScope, StoreError> {
        let txn = self
            .db
            .begin_with_config(Some(isolation(options.isolation)), Some(access(options.access)))
            .await
            .map_err(store_error)?;
        Ok(PgScope { txn })
    }

    async fn commit(&self, scope: PgScope) -> Result<(), StoreError> {
        scope.txn.commit().await.map_err(store_error)
    }

    async fn rollback(&self, scope: PgScope) -> Result<(), StoreError> {
        scope.txn.rollback().await.map_err(store_error)
    }
}

/// One open PostgreSQL transaction.
pub struct PgScope {
    txn: DatabaseTransaction,
}

impl PgScope {
    /// The underlying transaction.
    #[must_use]
    pub const fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }
}

#[async_trait]
impl BalanceStore for PgScope {
    async fn balance(&self, account_id: AccountId) -> Result<Option<Coins>, StoreError> {
        let row = accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(row.map(|a| a.balance))
    }

    async fn set_balance(&self, account_id: AccountId, balance: Coins) -> Result<(), StoreError> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(balance))
            .filter(accounts::Column::Id.eq(account_id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;

        if result.rows_affected == 0 {
            return Err(StoreError::new(format!("account {account_id} does not exist")));
        }
        debug!(%account_id, balance, "Balance updated");
        Ok(())
    }

    async fn account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(row.map(Account::from))
    }

    async fn item_by_name(&self, name: &str) -> Result<Option<CatalogItem>, StoreError> {
        let row = catalog_items::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(catalog_items::Column::Name)))
                    .eq(Func::lower(Expr::val(name))),
            )
            .one(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(row.map(CatalogItem::from))
    }

    async fn catalog(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let rows = catalog_items::Entity::find()
            .order_by_asc(catalog_items::Column::Price)
            .order_by_asc(catalog_items::Column::Name)
            .all(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    async fn append_transfer(&self, transfer: NewTransfer) -> Result<TransferRecord, StoreError> {
        let row = transfers::ActiveModel {
            id: Set(TransferId::new().into_inner()),
            sender_id: Set(transfer.sender_id.into_inner()),
            receiver_id: Set(transfer.receiver_id.into_inner()),
            amount: Set(transfer.amount),
            created_at: Set(transfer.created_at.into()),
        }
        .insert(&self.txn)
        .await
        .map_err(store_error)?;
        Ok(TransferRecord::from(row))
    }

    async fn append_purchase(&self, purchase: NewPurchase) -> Result<PurchaseRecord, StoreError> {
        let row = purchases::ActiveModel {
            id: Set(PurchaseId::new().into_inner()),
            account_id: Set(purchase.account_id.into_inner()),
            item_id: Set(purchase.item_id.into_inner()),
            created_at: Set(purchase.created_at.into()),
        }
        .insert(&self.txn)
        .await
        .map_err(store_error)?;
        Ok(PurchaseRecord::from(row))
    }

    async fn transfers_of(&self, account_id: AccountId) -> Result<Vec<TransferRecord>, StoreError> {
        let id = account_id.into_inner();
        let rows = transfers::Entity::find()
            .filter(
                Condition::any()
                    .add(transfers::Column::SenderId.eq(id))
                    .add(transfers::Column::ReceiverId.eq(id)),
            )
            .order_by_asc(transfers::Column::CreatedAt)
            .order_by_asc(transfers::Column::Id)
            .all(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(TransferRecord::from).collect())
    }

    async fn purchases_of(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<(PurchaseRecord, CatalogItem)>, StoreError> {
        let rows = purchases::Entity::find()
            .find_also_related(catalog_items::Entity)
            .filter(purchases::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(purchases::Column::CreatedAt)
            .order_by_asc(purchases::Column::Id)
            .all(&self.txn)
            .await
            .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|(purchase, item)| {
                Some((PurchaseRecord::from(purchase), CatalogItem::from(item?)))
            })
            .collect())
    }
}

// ========== Row Mapping ==========

impl From<accounts::Model> for Account {
    fn from(row: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(row.id),
            balance: row.balance,
            created_at: row.created_at.with_timezone(&Utc),
        }
    }
}

impl From<catalog_items::Model> for CatalogItem {
    fn from(row: catalog_items::Model) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            price: row.price,
        }
    }
}

impl From<transfers::Model> for TransferRecord {
    fn from(row: transfers::Model) -> Self {
        Self {
            id: row.id.into(),
            sender_id: row.sender_id.into(),
            receiver_id: row.receiver_id.into(),
            amount: row.amount,
            created_at: row.created_at.with_timezone(&Utc),
        }
    }
}

impl From<purchases::Model> for PurchaseRecord {
    fn from(row: purchases::Model) -> Self {
        Self {
            id: row.id.into(),
            account_id: row.account_id.into(),
            item_id: row.item_id.into(),
            created_at: row.created_at.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_levels_map_one_to_one() {
        assert!(matches!(
            isolation(IsolationLevel::Serializable),
            sea_orm::IsolationLevel::Serializable
        ));
        assert!(matches!(
            isolation(IsolationLevel::RepeatableRead),
            sea_orm::IsolationLevel::RepeatableRead
        ));
        assert!(matches!(
            isolation(IsolationLevel::ReadCommitted),
            sea_orm::IsolationLevel::ReadCommitted
        ));
        assert!(matches!(access(AccessMode::ReadOnly), sea_orm::AccessMode::ReadOnly));
        assert!(matches!(access(AccessMode::ReadWrite), sea_orm::AccessMode::ReadWrite));
    }
}
