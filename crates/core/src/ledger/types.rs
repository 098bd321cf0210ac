//! Ledger domain types.
//!
//! Accounts hold a single integer coin balance. Transfers and purchases are
//! append-only history records kept for display; they are never replayed.

use chrono::{DateTime, Utc};
use merchledger_shared::types::{AccountId, CatalogItemId, PurchaseId, TransferId};
use serde::{Deserialize, Serialize};

/// Coin amounts and balances. Coins are indivisible.
pub type Coins = i64;

/// An employee coin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The account ID.
    pub id: AccountId,
    /// Current balance, never negative in a committed state.
    pub balance: Coins,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

/// A merch item that can be bought with coins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// The item ID.
    pub id: CatalogItemId,
    /// Unique item name, e.g. `"cup"`.
    pub name: String,
    /// Price in coins, always positive.
    pub price: Coins,
}

/// A committed coin transfer between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// The record ID.
    pub id: TransferId,
    /// Account the coins left.
    pub sender_id: AccountId,
    /// Account the coins arrived at.
    pub receiver_id: AccountId,
    /// Transferred amount, always positive.
    pub amount: Coins,
    /// Commit time of the transfer.
    pub created_at: DateTime<Utc>,
}

/// A committed merch purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// The record ID.
    pub id: PurchaseId,
    /// The buying account.
    pub account_id: AccountId,
    /// The purchased item.
    pub item_id: CatalogItemId,
    /// Purchase time.
    pub created_at: DateTime<Utc>,
}

/// A transfer to be appended to the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    /// Account the coins leave.
    pub sender_id: AccountId,
    /// Account the coins arrive at.
    pub receiver_id: AccountId,
    /// Transferred amount.
    pub amount: Coins,
    /// Record timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewTransfer {
    /// Builds the committed record for this transfer under the given ID.
    #[must_use]
    pub fn into_record(self, id: TransferId) -> TransferRecord {
        TransferRecord {
            id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            amount: self.amount,
            created_at: self.created_at,
        }
    }
}

/// A purchase to be appended to the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchase {
    /// The buying account.
    pub account_id: AccountId,
    /// The purchased item.
    pub item_id: CatalogItemId,
    /// Record timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewPurchase {
    /// Builds the committed record for this purchase under the given ID.
    #[must_use]
    pub fn into_record(self, id: PurchaseId) -> PurchaseRecord {
        PurchaseRecord {
            id,
            account_id: self.account_id,
            item_id: self.item_id,
            created_at: self.created_at,
        }
    }
}

/// Transaction isolation level requested from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Each statement sees data committed before it began.
    ReadCommitted,
    /// The whole transaction sees one snapshot.
    RepeatableRead,
    /// Committed transactions behave as if run in some serial order.
    Serializable,
}

/// Whether a transaction may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Reads and writes allowed.
    ReadWrite,
    /// Writes are rejected by the store.
    ReadOnly,
}

/// Options a unit of work is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOptions {
    /// Isolation level.
    pub isolation: IsolationLevel,
    /// Access mode.
    pub access: AccessMode,
}

impl TxOptions {
    /// Serializable read-write, used for every balance-changing operation.
    pub const MONEY_MOVEMENT: Self = Self {
        isolation: IsolationLevel::Serializable,
        access: AccessMode::ReadWrite,
    };

    /// One consistent read-only snapshot, used for account summaries.
    pub const SNAPSHOT_READ: Self = Self {
        isolation: IsolationLevel::RepeatableRead,
        access: AccessMode::ReadOnly,
    };

    /// Cheapest read-only level, used for catalog listing.
    pub const PLAIN_READ: Self = Self {
        isolation: IsolationLevel::ReadCommitted,
        access: AccessMode::ReadOnly,
    };

    /// Returns `true` if the store must reject writes.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self.access, AccessMode::ReadOnly)
    }
}

/// One inventory line of an account summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Item name.
    pub name: String,
    /// How many times the account bought it.
    pub quantity: u32,
}

/// Coins received by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedCoins {
    /// Who sent them.
    pub from: AccountId,
    /// How many.
    pub amount: Coins,
    /// When.
    pub at: DateTime<Utc>,
}

/// Coins sent by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentCoins {
    /// Who received them.
    pub to: AccountId,
    /// How many.
    pub amount: Coins,
    /// When.
    pub at: DateTime<Utc>,
}

/// Transfer history of an account, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinHistory {
    /// Incoming transfers, oldest first.
    pub received: Vec<ReceivedCoins>,
    /// Outgoing transfers, oldest first.
    pub sent: Vec<SentCoins>,
}

/// Balance, inventory and coin history of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// The account ID.
    pub account_id: AccountId,
    /// Current balance.
    pub balance: Coins,
    /// Purchased items grouped by name, sorted by name.
    pub inventory: Vec<InventoryItem>,
    /// Transfers in and out.
    pub coin_history: CoinHistory,
}
