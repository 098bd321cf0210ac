//! `SeaORM` entity definitions for the ledger tables.

pub mod accounts;
pub mod catalog_items;
pub mod purchases;
pub mod transfers;
