//! Account repository for opening and looking up coin accounts.
//!
//! Balance changes never go through here; they run inside ledger
//! transactions on `PgScope`.

use chrono::Utc;
use merchledger_core::ledger::{Account, Coins};
use merchledger_shared::types::AccountId;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Set};

use crate::entities::accounts;

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Opening balance below zero.
    #[error("Opening balance must not be negative, got {0}")]
    NegativeBalance(Coins),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens an account with the given starting balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the balance is negative or the insert fails.
    pub async fn open(&self, starting_balance: Coins) -> Result<Account, AccountError> {
        if starting_balance < 0 {
            return Err(AccountError::NegativeBalance(starting_balance));
        }

        let row = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            balance: Set(starting_balance),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        Ok(Account::from(row))
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, DbErr> {
        Ok(accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(Account::from))
    }

    /// Counts all accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64, DbErr> {
        accounts::Entity::find().count(&self.db).await
    }
}
