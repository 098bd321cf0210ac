//! Core business logic for the merch coin ledger.
//!
//! This crate has no database dependencies. It defines the store contracts,
//! the transaction boundary with conflict retries, and the transfer,
//! purchase and summary operations built on them.
//!
//! # Modules
//!
//! - `ledger` - Coin balances, transfers and purchases

pub mod ledger;
