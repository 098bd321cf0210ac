//! Hooks for committed operations, scheduled retries and failures.
//!
//! The service reports through a `LedgerObserver` instead of logging inline,
//! so tests can record events and deployments can plug in their own sink.

use std::time::Duration;

use tracing::{error, info, warn};

use super::error::{LedgerError, StoreError};
use super::types::{CatalogItem, PurchaseRecord, TransferRecord};

/// Receives ledger events. Every hook defaults to a no-op.
pub trait LedgerObserver: Send + Sync {
    /// A transfer was committed.
    fn transfer_committed(&self, _record: &TransferRecord) {}

    /// A purchase was committed.
    fn purchase_committed(&self, _record: &PurchaseRecord, _item: &CatalogItem) {}

    /// A conflicting attempt will be retried after `delay`.
    fn retry_scheduled(
        &self,
        _operation: &'static str,
        _attempt: u32,
        _delay: Duration,
        _conflict: &StoreError,
    ) {
    }

    /// An operation returned an error to its caller.
    fn operation_failed(&self, _operation: &'static str, _error: &LedgerError) {}
}

/// Default observer writing structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LedgerObserver for TracingObserver {
    fn transfer_committed(&self, record: &TransferRecord) {
        info!(
            transfer_id = %record.id,
            sender_id = %record.sender_id,
            receiver_id = %record.receiver_id,
            amount = record.amount,
            "Coins transferred"
        );
    }

    fn purchase_committed(&self, record: &PurchaseRecord, item: &CatalogItem) {
        info!(
            purchase_id = %record.id,
            account_id = %record.account_id,
            item = %item.name,
            price = item.price,
            "Merch purchased"
        );
    }

    fn retry_scheduled(
        &self,
        operation: &'static str,
        attempt: u32,
        delay: Duration,
        conflict: &StoreError,
    ) {
        warn!(
            operation,
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %conflict,
            "Serialization conflict, retrying"
        );
    }

    fn operation_failed(&self, operation: &'static str, err: &LedgerError) {
        if err.is_rejection() || matches!(err, LedgerError::Cancelled) {
            warn!(operation, code = err.error_code(), error = %err, "Operation rejected");
        } else {
            error!(operation, code = err.error_code(), error = %err, "Operation failed");
        }
    }
}
