//! Catalog repository.
//!
//! Items are created once and never changed; the ledger reads prices
//! inside its own transactions.

use merchledger_core::ledger::{CatalogItem, Coins};
use merchledger_shared::types::CatalogItemId;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::catalog_items;

/// Error types for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Price zero or negative.
    #[error("Price must be positive, got {0}")]
    InvalidPrice(Coins),

    /// Name empty after trimming.
    #[error("Item name must not be empty")]
    EmptyName,

    /// An item with this name already exists, ignoring case.
    #[error("Item '{0}' already exists")]
    DuplicateName(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Catalog repository.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    db: DatabaseConnection,
}

impl CatalogRepository {
    /// Creates a new catalog repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds an item to the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or taken, the price is not
    /// positive, or the insert fails.
    pub async fn create(&self, name: &str, price: Coins) -> Result<CatalogItem, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if price <= 0 {
            return Err(CatalogError::InvalidPrice(price));
        }
        if self.find_by_name(name).await?.is_some() {
            return Err(CatalogError::DuplicateName(name.to_string()));
        }

        let row = catalog_items::ActiveModel {
            id: Set(CatalogItemId::new().into_inner()),
            name: Set(name.to_string()),
            price: Set(price),
        }
        .insert(&self.db)
        .await?;

        Ok(CatalogItem::from(row))
    }

    /// Finds an item by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<CatalogItem>, DbErr> {
        Ok(catalog_items::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(catalog_items::Column::Name)))
                    .eq(Func::lower(Expr::val(name))),
            )
            .one(&self.db)
            .await?
            .map(CatalogItem::from))
    }

    /// Lists all items, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<CatalogItem>, DbErr> {
        Ok(catalog_items::Entity::find()
            .order_by_asc(catalog_items::Column::Price)
            .order_by_asc(catalog_items::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(CatalogItem::from)
            .collect())
    }
}
