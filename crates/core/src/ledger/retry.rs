//! Bounded retry of serialization conflicts.
//!
//! Serializable isolation reports a conflicting interleaving as an error
//! instead of blocking. Re-running the whole unit of work is safe because
//! every attempt re-reads balances inside its own transaction and a failed
//! attempt leaves nothing behind.

use std::time::Duration;

use merchledger_shared::LedgerConfig;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::coordinator::run_in_transaction;
use super::error::LedgerError;
use super::observer::LedgerObserver;
use super::store::{TransactionCoordinator, UnitOfWork};
use super::types::TxOptions;

/// Linear-backoff retry policy for serialization conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_step: Duration,
}

impl RetryPolicy {
    /// Attempts per operation unless configured otherwise.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    /// Backoff step unless configured otherwise.
    pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(100);

    /// Creates a policy. `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_step,
        }
    }

    /// Creates a policy from the `ledger` configuration section.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_step())
    }

    /// Attempts per operation, including the first one.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the given failed attempt: `attempt * step`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }

    /// Runs `work` through `run_in_transaction`, retrying conflicts.
    ///
    /// Non-conflict errors (business rejections, store failures,
    /// cancellation) are returned at once. When every attempt conflicts the
    /// last conflict is returned as `LedgerError::RetriesExhausted`.
    /// Cancellation interrupts the backoff sleep.
    pub async fn execute<C, W>(
        &self,
        coordinator: &C,
        options: TxOptions,
        cancel: &CancellationToken,
        work: &W,
        observer: &dyn LedgerObserver,
    ) -> Result<W::Output, LedgerError>
    where
        C: TransactionCoordinator + ?Sized,
        W: UnitOfWork<C::Scope> + ?Sized,
    {
        let mut attempt = 1;

        loop {
            let err = match run_in_transaction(coordinator, options, cancel, work).await {
                Ok(output) => return Ok(output),
                Err(LedgerError::Store(err)) if coordinator.is_conflict(&err) => err,
                Err(err) => return Err(err),
            };

            if attempt >= self.max_attempts {
                warn!(
                    unit = work.name(),
                    attempts = attempt,
                    error = %err,
                    "Giving up after repeated serialization conflicts"
                );
                return Err(LedgerError::RetriesExhausted {
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.backoff(attempt);
            observer.retry_scheduled(work.name(), attempt, delay, &err);

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(LedgerError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BACKOFF_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(300));
    }

    #[test]
    fn test_max_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = LedgerConfig {
            max_attempts: 7,
            backoff_step_ms: 5,
            starting_balance: 1000,
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts(), 7);
        assert_eq!(policy.backoff(2), Duration::from_millis(10));
    }
}
