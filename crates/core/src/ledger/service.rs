//! Ledger service: the public entry point for coin operations.
//!
//! Each operation builds a command, runs it through the retry policy with
//! the isolation level it needs, and reports the outcome to the observer.

use std::sync::Arc;

use merchledger_shared::types::AccountId;
use tokio_util::sync::CancellationToken;

use super::error::LedgerError;
use super::observer::{LedgerObserver, TracingObserver};
use super::purchase::{CompletedPurchase, PurchaseMerch};
use super::retry::RetryPolicy;
use super::store::TransactionCoordinator;
use super::summary::{AccountSummaryQuery, CatalogQuery};
use super::transfer::TransferCoins;
use super::types::{AccountSummary, CatalogItem, Coins, TransferRecord, TxOptions};

/// Runs ledger operations against a transaction coordinator.
pub struct LedgerService<C> {
    coordinator: C,
    retry: RetryPolicy,
    observer: Arc<dyn LedgerObserver>,
}

impl<C: TransactionCoordinator> LedgerService<C> {
    /// Creates a service with the default retry policy and tracing observer.
    pub fn new(coordinator: C) -> Self {
        Self {
            coordinator,
            retry: RetryPolicy::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LedgerObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The underlying coordinator.
    pub const fn coordinator(&self) -> &C {
        &self.coordinator
    }

    /// The active retry policy.
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Transfers `amount` coins from `sender` to `receiver`.
    ///
    /// Runs serializable and read-write. Either both balances change and the
    /// transfer is recorded, or nothing changes.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` / `SelfTransfer` before any store access
    /// - `AccountNotFound` if either account is missing
    /// - `InsufficientFunds` if the sender cannot cover `amount`
    /// - `RetriesExhausted` if every attempt conflicted
    /// - `Cancelled` if `cancel` fired first
    /// - `Store` for any other store failure
    pub async fn transfer_coins(
        &self,
        cancel: &CancellationToken,
        sender: AccountId,
        receiver: AccountId,
        amount: Coins,
    ) -> Result<TransferRecord, LedgerError> {
        let result = match TransferCoins::new(sender, receiver, amount) {
            Ok(command) => {
                self.retry
                    .execute(
                        &self.coordinator,
                        TxOptions::MONEY_MOVEMENT,
                        cancel,
                        &command,
                        self.observer.as_ref(),
                    )
                    .await
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(record) => self.observer.transfer_committed(record),
            Err(e) => self.observer.operation_failed(TransferCoins::OPERATION, e),
        }
        result
    }

    /// Buys one unit of the named catalog item for `account`.
    ///
    /// The name is matched ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if no item has this name
    /// - `AccountNotFound` if the account is missing
    /// - `InsufficientFunds` if the balance is below the price
    /// - `RetriesExhausted`, `Cancelled` or `Store` as for transfers
    pub async fn purchase_merch(
        &self,
        cancel: &CancellationToken,
        account: AccountId,
        item_name: &str,
    ) -> Result<CompletedPurchase, LedgerError> {
        let result = match PurchaseMerch::new(account, item_name) {
            Ok(command) => {
                self.retry
                    .execute(
                        &self.coordinator,
                        TxOptions::MONEY_MOVEMENT,
                        cancel,
                        &command,
                        self.observer.as_ref(),
                    )
                    .await
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(done) => self.observer.purchase_committed(&done.record, &done.item),
            Err(e) => self.observer.operation_failed(PurchaseMerch::OPERATION, e),
        }
        result
    }

    /// Returns balance, inventory and coin history of `account` as seen by
    /// one read-only snapshot.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account is missing, otherwise as for
    /// transfers.
    pub async fn account_summary(
        &self,
        cancel: &CancellationToken,
        account: AccountId,
    ) -> Result<AccountSummary, LedgerError> {
        let query = AccountSummaryQuery::new(account);
        let result = self
            .retry
            .execute(
                &self.coordinator,
                TxOptions::SNAPSHOT_READ,
                cancel,
                &query,
                self.observer.as_ref(),
            )
            .await;

        if let Err(e) = &result {
            self.observer.operation_failed(AccountSummaryQuery::OPERATION, e);
        }
        result
    }

    /// Lists the catalog, cheapest first.
    ///
    /// # Errors
    ///
    /// `Cancelled` or `Store`.
    pub async fn list_catalog(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<CatalogItem>, LedgerError> {
        let result = self
            .retry
            .execute(
                &self.coordinator,
                TxOptions::PLAIN_READ,
                cancel,
                &CatalogQuery,
                self.observer.as_ref(),
            )
            .await;

        if let Err(e) = &result {
            self.observer.operation_failed(CatalogQuery::OPERATION, e);
        }
        result
    }
}
