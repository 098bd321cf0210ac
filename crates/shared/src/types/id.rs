//! Identifiers for ledger rows.
//!
//! Accounts, catalog items, transfers and purchases are all keyed by UUID v7
//! columns. Each gets its own newtype so a purchase cannot swap its account
//! and item, and a transfer cannot swap sender and receiver ids with a record
//! id. The wrappers serialize as the bare UUID and convert to and from
//! `Uuid` for the database entities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID newtype for one kind of ledger row.
macro_rules! ledger_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Allocates a fresh id. UUID v7 sorts by creation time.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wraps a UUID read back from storage.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Unwraps the UUID for storage.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

ledger_id!(AccountId, "Unique identifier for an employee coin account.");
ledger_id!(CatalogItemId, "Unique identifier for a merch catalog item.");
ledger_id!(TransferId, "Unique identifier for a coin transfer record.");
ledger_id!(PurchaseId, "Unique identifier for a merch purchase record.");
