//! Store contracts the engine runs against.
//!
//! The engine never talks to a database directly. A backend provides:
//! - a `TransactionCoordinator` that opens, commits and rolls back scoped
//!   transactions,
//! - a `BalanceStore` handle bound to one open transaction, through which
//!   every read and write of a unit of work goes,
//! - a `ConflictClassifier` recognising its own serialization failures.
//!
//! Business logic is expressed as `UnitOfWork` command objects, so it can be
//! exercised against the in-memory backend and PostgreSQL alike.

use async_trait::async_trait;
use merchledger_shared::types::AccountId;

use super::error::{LedgerError, StoreError};
use super::types::{
    Account, CatalogItem, Coins, NewPurchase, NewTransfer, PurchaseRecord, TransferRecord,
    TxOptions,
};

/// Transaction-scoped execution handle.
///
/// Every method runs inside the transaction the handle was opened for.
/// Handles must not outlive their transaction.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Reads the balance of an account, `None` if it does not exist.
    async fn balance(&self, account_id: AccountId) -> Result<Option<Coins>, StoreError>;

    /// Overwrites the balance of an existing account.
    async fn set_balance(&self, account_id: AccountId, balance: Coins) -> Result<(), StoreError>;

    /// Reads a whole account row.
    async fn account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Looks up a catalog item by name, ignoring ASCII case.
    async fn item_by_name(&self, name: &str) -> Result<Option<CatalogItem>, StoreError>;

    /// Lists the whole catalog, cheapest first.
    async fn catalog(&self) -> Result<Vec<CatalogItem>, StoreError>;

    /// Appends a transfer record.
    async fn append_transfer(&self, transfer: NewTransfer) -> Result<TransferRecord, StoreError>;

    /// Appends a purchase record.
    async fn append_purchase(&self, purchase: NewPurchase) -> Result<PurchaseRecord, StoreError>;

    /// Transfers the account sent or received, oldest first.
    async fn transfers_of(&self, account_id: AccountId) -> Result<Vec<TransferRecord>, StoreError>;

    /// Purchases of the account paired with the bought item, oldest first.
    async fn purchases_of(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<(PurchaseRecord, CatalogItem)>, StoreError>;
}

/// Recognises the store's serialization-conflict signal.
///
/// This is the only store-specific knowledge the retry loop depends on.
pub trait ConflictClassifier: Send + Sync {
    /// Returns `true` if `err` means "retry the whole transaction".
    fn is_conflict(&self, err: &StoreError) -> bool;
}

/// Opens and finishes scoped transactions.
#[async_trait]
pub trait TransactionCoordinator: ConflictClassifier {
    /// Handle bound to one open transaction.
    type Scope: BalanceStore;

    /// Opens a transaction with the requested isolation level and access mode.
    async fn begin(&self, options: TxOptions) -> Result<Self::Scope, StoreError>;

    /// Commits the transaction, consuming its handle.
    async fn commit(&self, scope: Self::Scope) -> Result<(), StoreError>;

    /// Rolls the transaction back, consuming its handle.
    async fn rollback(&self, scope: Self::Scope) -> Result<(), StoreError>;
}

/// A command executed inside one transaction.
///
/// `execute` may run several times when the store reports conflicts, each
/// time against a fresh transaction; it must derive everything it writes
/// from what it reads through `store`.
#[async_trait]
pub trait UnitOfWork<S: BalanceStore + ?Sized>: Send + Sync {
    /// Value produced on commit.
    type Output: Send;

    /// Short name used in logs, e.g. `"transfer_coins"`.
    fn name(&self) -> &'static str;

    /// Runs the command body.
    async fn execute(&self, store: &S) -> Result<Self::Output, LedgerError>;
}
