//! In-memory backend with optimistic serializable transactions.
//!
//! Each account row carries a version. Above read-committed, a transaction
//! takes a snapshot of the accounts and the history lengths when it begins
//! and serves every read from it. A read-write transaction remembers the
//! version of every account it read; commit fails with a serialization
//! conflict if any of them changed in the meantime. Writes and appended
//! records stay private to the transaction until commit.
//!
//! The backend also supports fault injection (conflicts, failing begins,
//! commits, appends and rollbacks) and optional yielding on every store call
//! so that concurrent tasks interleave between read and commit.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use merchledger_shared::types::{AccountId, CatalogItemId, PurchaseId, TransferId};
use parking_lot::Mutex;

use super::error::StoreError;
use super::store::{BalanceStore, ConflictClassifier, TransactionCoordinator};
use super::types::{
    Account, CatalogItem, Coins, IsolationLevel, NewPurchase, NewTransfer, PurchaseRecord,
    TransferRecord, TxOptions,
};

/// Code attached to serialization conflicts.
pub const CONFLICT_CODE: &str = "MEM_SERIALIZATION_FAILURE";
/// Code attached to writes attempted in a read-only transaction.
pub const READ_ONLY_CODE: &str = "MEM_READ_ONLY";
/// Code attached to writes breaking a row constraint.
pub const CHECK_VIOLATION_CODE: &str = "MEM_CHECK_VIOLATION";

/// Transaction counters, for assertions in tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Transactions opened.
    pub begins: u64,
    /// Transactions committed.
    pub commits: u64,
    /// Transactions rolled back.
    pub rollbacks: u64,
    /// Commits refused with a serialization conflict.
    pub conflicts: u64,
}

#[derive(Debug)]
struct VersionedAccount {
    account: Account,
    version: u64,
}

#[derive(Debug, Default)]
struct Faults {
    commit_conflicts: u32,
    commit_failures: u32,
    begin_failures: u32,
    append_failures: u32,
    rollback_failures: u32,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, VersionedAccount>,
    items: Vec<CatalogItem>,
    transfers: Vec<TransferRecord>,
    purchases: Vec<PurchaseRecord>,
    faults: Faults,
    stats: LedgerStats,
}

/// Shared in-memory ledger. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<State>>,
    interleave: bool,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Yields to the scheduler on every store call of every transaction.
    #[must_use]
    pub fn with_interleaving(mut self) -> Self {
        self.interleave = true;
        self
    }

    /// Opens an account with the given balance.
    ///
    /// # Errors
    ///
    /// Returns a check violation if `balance` is negative.
    pub fn open_account(&self, balance: Coins) -> Result<Account, StoreError> {
        if balance < 0 {
            return Err(check_violation("balance must not be negative"));
        }
        let account = Account {
            id: AccountId::new(),
            balance,
            created_at: Utc::now(),
        };
        self.state.lock().accounts.insert(
            account.id,
            VersionedAccount {
                account: account.clone(),
                version: 0,
            },
        );
        Ok(account)
    }

    /// Adds a catalog item.
    ///
    /// # Errors
    ///
    /// Returns a check violation if `price` is not positive or the name is
    /// already taken, ignoring case.
    pub fn add_item(&self, name: &str, price: Coins) -> Result<CatalogItem, StoreError> {
        if price <= 0 {
            return Err(check_violation("price must be positive"));
        }
        let mut state = self.state.lock();
        if state.items.iter().any(|i| i.name.eq_ignore_ascii_case(name)) {
            return Err(check_violation(format!("item '{name}' already exists")));
        }
        let item = CatalogItem {
            id: CatalogItemId::new(),
            name: name.to_string(),
            price,
        };
        state.items.push(item.clone());
        Ok(item)
    }

    /// Committed balance of an account.
    #[must_use]
    pub fn committed_balance(&self, account_id: AccountId) -> Option<Coins> {
        self.state
            .lock()
            .accounts
            .get(&account_id)
            .map(|v| v.account.balance)
    }

    /// Sum of all committed balances.
    #[must_use]
    pub fn total_balance(&self) -> Coins {
        self.state
            .lock()
            .accounts
            .values()
            .map(|v| v.account.balance)
            .sum()
    }

    /// Committed transfer history, oldest first.
    #[must_use]
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.state.lock().transfers.clone()
    }

    /// Committed purchase history, oldest first.
    #[must_use]
    pub fn purchases(&self) -> Vec<PurchaseRecord> {
        self.state.lock().purchases.clone()
    }

    /// Transaction counters so far.
    #[must_use]
    pub fn stats(&self) -> LedgerStats {
        self.state.lock().stats
    }

    /// Makes the next `n` commits fail with a serialization conflict.
    pub fn inject_commit_conflicts(&self, n: u32) {
        self.state.lock().faults.commit_conflicts = n;
    }

    /// Makes the next `n` commits fail with a plain store error that is not
    /// a conflict. Nothing from those transactions is applied.
    pub fn fail_next_commits(&self, n: u32) {
        self.state.lock().faults.commit_failures = n;
    }

    /// Makes the next `n` transaction opens fail.
    pub fn fail_next_begins(&self, n: u32) {
        self.state.lock().faults.begin_failures = n;
    }

    /// Makes the next `n` history appends fail.
    pub fn fail_next_appends(&self, n: u32) {
        self.state.lock().faults.append_failures = n;
    }

    /// Makes the next `n` rollbacks report an error. The transaction is
    /// still discarded.
    pub fn fail_next_rollbacks(&self, n: u32) {
        self.state.lock().faults.rollback_failures = n;
    }
}

fn conflict() -> StoreError {
    StoreError::new("could not serialize access due to concurrent update").with_code(CONFLICT_CODE)
}

fn check_violation(message: impl Into<String>) -> StoreError {
    StoreError::new(message).with_code(CHECK_VIOLATION_CODE)
}

/// Committed state as of `begin`.
#[derive(Debug)]
struct Snapshot {
    accounts: HashMap<AccountId, (u64, Account)>,
    transfers: usize,
    purchases: usize,
}

impl Snapshot {
    fn capture(state: &State) -> Self {
        Self {
            accounts: state
                .accounts
                .iter()
                .map(|(id, v)| (*id, (v.version, v.account.clone())))
                .collect(),
            transfers: state.transfers.len(),
            purchases: state.purchases.len(),
        }
    }
}

#[derive(Debug, Default)]
struct Pending {
    reads: HashMap<AccountId, (u64, Account)>,
    writes: HashMap<AccountId, Coins>,
    transfers: Vec<TransferRecord>,
    purchases: Vec<PurchaseRecord>,
}

/// One open transaction on a `MemoryLedger`.
#[derive(Debug)]
pub struct MemoryScope {
    state: Arc<Mutex<State>>,
    options: TxOptions,
    interleave: bool,
    snapshot: Option<Snapshot>,
    pending: Mutex<Pending>,
}

impl MemoryScope {
    async fn pause(&self) {
        if self.interleave {
            tokio::task::yield_now().await;
        }
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        if self.options.is_read_only() {
            return Err(StoreError::new("cannot write in a read-only transaction")
                .with_code(READ_ONLY_CODE));
        }
        Ok(())
    }

    /// Reads an account from the snapshot, or from committed state under
    /// read-committed, and overlays this transaction's own writes.
    fn read_account(&self, account_id: AccountId) -> Option<Account> {
        let mut pending = self.pending.lock();
        if !pending.reads.contains_key(&account_id) {
            let found = match &self.snapshot {
                Some(snapshot) => snapshot.accounts.get(&account_id).cloned(),
                None => self
                    .state
                    .lock()
                    .accounts
                    .get(&account_id)
                    .map(|v| (v.version, v.account.clone())),
            }?;
            pending.reads.insert(account_id, found);
        }
        let mut account = pending.reads.get(&account_id)?.1.clone();
        if let Some(balance) = pending.writes.get(&account_id) {
            account.balance = *balance;
        }
        Some(account)
    }

    fn take_append_fault(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.faults.append_failures > 0 {
            state.faults.append_failures -= 1;
            return Err(StoreError::new("injected append failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl BalanceStore for MemoryScope {
    async fn balance(&self, account_id: AccountId) -> Result<Option<Coins>, StoreError> {
        let balance = self.read_account(account_id).map(|a| a.balance);
        self.pause().await;
        Ok(balance)
    }

    async fn set_balance(&self, account_id: AccountId, balance: Coins) -> Result<(), StoreError> {
        self.ensure_writable()?;
        if balance < 0 {
            return Err(check_violation("balance must not be negative"));
        }
        if self.read_account(account_id).is_none() {
            return Err(StoreError::new(format!("account {account_id} does not exist")));
        }
        self.pending.lock().writes.insert(account_id, balance);
        self.pause().await;
        Ok(())
    }

    async fn account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let account = self.read_account(account_id);
        self.pause().await;
        Ok(account)
    }

    async fn item_by_name(&self, name: &str) -> Result<Option<CatalogItem>, StoreError> {
        let item = self
            .state
            .lock()
            .items
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(name))
            .cloned();
        self.pause().await;
        Ok(item)
    }

    async fn catalog(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let mut items = self.state.lock().items.clone();
        items.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        self.pause().await;
        Ok(items)
    }

    async fn append_transfer(&self, transfer: NewTransfer) -> Result<TransferRecord, StoreError> {
        self.ensure_writable()?;
        self.take_append_fault()?;
        if transfer.amount <= 0 || transfer.sender_id == transfer.receiver_id {
            return Err(check_violation("transfer violates row constraints"));
        }
        let record = transfer.into_record(TransferId::new());
        self.pending.lock().transfers.push(record.clone());
        self.pause().await;
        Ok(record)
    }

    async fn append_purchase(&self, purchase: NewPurchase) -> Result<PurchaseRecord, StoreError> {
        self.ensure_writable()?;
        self.take_append_fault()?;
        if !self.state.lock().items.iter().any(|i| i.id == purchase.item_id) {
            return Err(StoreError::new(format!(
                "catalog item {} does not exist",
                purchase.item_id
            )));
        }
        let record = purchase.into_record(PurchaseId::new());
        self.pending.lock().purchases.push(record.clone());
        self.pause().await;
        Ok(record)
    }

    async fn transfers_of(&self, account_id: AccountId) -> Result<Vec<TransferRecord>, StoreError> {
        let involves = |t: &&TransferRecord| t.sender_id == account_id || t.receiver_id == account_id;
        let mut out: Vec<TransferRecord> = {
            let state = self.state.lock();
            let visible = self.snapshot.as_ref().map_or(state.transfers.len(), |s| s.transfers);
            state.transfers[..visible].iter().filter(involves).cloned().collect()
        };
        out.extend(self.pending.lock().transfers.iter().filter(involves).cloned());
        self.pause().await;
        Ok(out)
    }

    async fn purchases_of(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<(PurchaseRecord, CatalogItem)>, StoreError> {
        let uncommitted = self.pending.lock().purchases.clone();
        let (committed, items) = {
            let state = self.state.lock();
            let visible = self.snapshot.as_ref().map_or(state.purchases.len(), |s| s.purchases);
            (state.purchases[..visible].to_vec(), state.items.clone())
        };
        let out = committed
            .into_iter()
            .chain(uncommitted)
            .filter(|p| p.account_id == account_id)
            .filter_map(|p| {
                let item = items.iter().find(|i| i.id == p.item_id)?.clone();
                Some((p, item))
            })
            .collect();
        self.pause().await;
        Ok(out)
    }
}

impl ConflictClassifier for MemoryLedger {
    fn is_conflict(&self, err: &StoreError) -> bool {
        err.code() == Some(CONFLICT_CODE)
    }
}

#[async_trait]
impl TransactionCoordinator for MemoryLedger {
    type Scope = MemoryScope;

    async fn begin(&self, options: TxOptions) -> Result<MemoryScope, StoreError> {
        let mut state = self.state.lock();
        if state.faults.begin_failures > 0 {
            state.faults.begin_failures -= 1;
            return Err(StoreError::new("injected connection failure"));
        }
        state.stats.begins += 1;
        let snapshot =
            (options.isolation != IsolationLevel::ReadCommitted).then(|| Snapshot::capture(&state));
        Ok(MemoryScope {
            state: Arc::clone(&self.state),
            options,
            interleave: self.interleave,
            snapshot,
            pending: Mutex::new(Pending::default()),
        })
    }

    async fn commit(&self, scope: MemoryScope) -> Result<(), StoreError> {
        let options = scope.options;
        let pending = scope.pending.into_inner();
        let mut state = self.state.lock();

        if state.faults.commit_conflicts > 0 {
            state.faults.commit_conflicts -= 1;
            state.stats.conflicts += 1;
            return Err(conflict());
        }
        if state.faults.commit_failures > 0 {
            state.faults.commit_failures -= 1;
            return Err(StoreError::new("injected commit failure: connection reset"));
        }

        let validates = !options.is_read_only() && options.isolation != IsolationLevel::ReadCommitted;
        if validates {
            let stale = pending.reads.iter().any(|(id, (version, _))| {
                state.accounts.get(id).map(|v| v.version) != Some(*version)
            });
            if stale {
                state.stats.conflicts += 1;
                return Err(conflict());
            }
        }

        for (id, balance) in pending.writes {
            if let Some(row) = state.accounts.get_mut(&id) {
                row.account.balance = balance;
                row.version += 1;
            }
        }
        state.transfers.extend(pending.transfers);
        state.purchases.extend(pending.purchases);
        state.stats.commits += 1;
        Ok(())
    }

    async fn rollback(&self, scope: MemoryScope) -> Result<(), StoreError> {
        drop(scope);
        let mut state = self.state.lock();
        state.stats.rollbacks += 1;
        if state.faults.rollback_failures > 0 {
            state.faults.rollback_failures -= 1;
            return Err(StoreError::new("injected rollback failure"));
        }
        Ok(())
    }
}
