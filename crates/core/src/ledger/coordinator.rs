//! Atomic execution boundary for one unit of work.
//!
//! `run_in_transaction` opens a transaction, runs the command against the
//! transaction's handle and either commits or rolls back. Errors from the
//! command and from commit come back untouched so that the retry loop can
//! classify them.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::error::LedgerError;
use super::store::{TransactionCoordinator, UnitOfWork};
use super::types::TxOptions;

/// Runs `work` inside one transaction opened with `options`.
///
/// - An error while opening the transaction is returned immediately.
/// - If `work` fails, the transaction is rolled back and the error returned.
/// - If `cancel` fires before commit, the transaction is rolled back and
///   `LedgerError::Cancelled` returned; nothing is committed.
/// - If commit fails, the commit error is returned. The backend discards the
///   transaction in that case.
///
/// A failed rollback is logged and never replaces the primary error.
pub async fn run_in_transaction<C, W>(
    coordinator: &C,
    options: TxOptions,
    cancel: &CancellationToken,
    work: &W,
) -> Result<W::Output, LedgerError>
where
    C: TransactionCoordinator + ?Sized,
    W: UnitOfWork<C::Scope> + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(LedgerError::Cancelled);
    }

    let scope = coordinator.begin(options).await?;
    debug!(unit = work.name(), ?options, "Transaction started");

    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(LedgerError::Cancelled),
        result = work.execute(&scope) => result,
    };

    match outcome {
        Ok(_) if cancel.is_cancelled() => {
            rollback_quietly(coordinator, scope, work.name()).await;
            Err(LedgerError::Cancelled)
        }
        Ok(output) => {
            debug!(unit = work.name(), "Committing transaction");
            coordinator.commit(scope).await?;
            Ok(output)
        }
        Err(err) => {
            debug!(unit = work.name(), error = %err, "Rolling back transaction");
            rollback_quietly(coordinator, scope, work.name()).await;
            Err(err)
        }
    }
}

async fn rollback_quietly<C>(coordinator: &C, scope: C::Scope, unit: &'static str)
where
    C: TransactionCoordinator + ?Sized,
{
    if let Err(e) = coordinator.rollback(scope).await {
        error!(unit, error = %e, "Rollback failed");
    }
}
