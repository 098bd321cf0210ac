//! Coin ledger transaction engine.
//!
//! This module implements:
//! - Store contracts (`BalanceStore`, `TransactionCoordinator`)
//! - The transaction boundary and conflict retry policy
//! - Transfer and purchase commands
//! - Read-only account summary and catalog queries
//! - The `LedgerService` tying them together
//! - An in-memory backend

pub mod coordinator;
pub mod error;
pub mod memory;
pub mod observer;
pub mod purchase;
pub mod retry;
pub mod service;
pub mod store;
pub mod summary;
pub mod transfer;
pub mod types;

#[cfg(test)]
mod service_props;

pub use coordinator::run_in_transaction;
pub use error::{LedgerError, StoreError};
pub use memory::{LedgerStats, MemoryLedger, MemoryScope};
pub use observer::{LedgerObserver, TracingObserver};
pub use purchase::{CompletedPurchase, PurchaseMerch};
pub use retry::RetryPolicy;
pub use service::LedgerService;
pub use store::{BalanceStore, ConflictClassifier, TransactionCoordinator, UnitOfWork};
pub use summary::{AccountSummaryQuery, CatalogQuery, summarize};
pub use transfer::TransferCoins;
pub use types::{
    AccessMode, Account, AccountSummary, CatalogItem, CoinHistory, Coins, InventoryItem,
    IsolationLevel, NewPurchase, NewTransfer, PurchaseRecord, ReceivedCoins, SentCoins,
    TransferRecord, TxOptions,
};
