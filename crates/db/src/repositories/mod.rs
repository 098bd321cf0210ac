//! Repository abstractions for data access.
//!
//! Repositories cover setup and lookups outside ledger transactions.

pub mod account;
pub mod catalog;

pub use account::{AccountError, AccountRepository};
pub use catalog::{CatalogError, CatalogRepository};
