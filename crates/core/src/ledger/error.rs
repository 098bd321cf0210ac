//! Ledger error types.
//!
//! `StoreError` is what a storage backend reports. `LedgerError` is what the
//! engine returns to its callers: validation and not-found rejections,
//! exhausted conflict retries, cancellation, and store failures.

use std::fmt;

use merchledger_shared::AppError;
use merchledger_shared::types::AccountId;
use thiserror::Error;

use super::types::Coins;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure reported by a storage backend.
///
/// Backends attach their native status code (a PostgreSQL SQLSTATE, for
/// instance) so that a `ConflictClassifier` can recognise serialization
/// failures without parsing messages.
#[derive(Debug)]
pub struct StoreError {
    message: String,
    code: Option<String>,
    source: Option<BoxError>,
}

impl StoreError {
    /// Creates an error with a message and no code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            source: None,
        }
    }

    /// Attaches the backend status code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches the underlying driver error.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the backend status code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} (code {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Errors returned by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Transfer amount is zero or negative.
    #[error("Invalid transfer amount {0}: amount must be positive")]
    InvalidAmount(Coins),

    /// Sender and receiver are the same account.
    #[error("Cannot transfer coins to yourself")]
    SelfTransfer,

    /// The paying account cannot cover the amount.
    #[error("Insufficient funds on account {account_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        /// The paying account.
        account_id: AccountId,
        /// Its balance when checked.
        balance: Coins,
        /// The amount the operation needed.
        required: Coins,
    },

    // ========== Not Found Errors ==========
    /// Account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// No catalog item with this name.
    #[error("Catalog item not found: {0}")]
    ItemNotFound(String),

    // ========== Concurrency Errors ==========
    /// Every attempt hit a serialization conflict.
    #[error("Operation failed after {attempts} attempts due to concurrent updates")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// The last conflict reported by the store.
        #[source]
        source: StoreError,
    },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    // ========== Store Errors ==========
    /// The store failed for a reason other than a business rule.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::SelfTransfer => "SELF_TRANSFER",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ItemNotFound(_) => "ITEM_NOT_FOUND",
            Self::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            Self::Cancelled => "CANCELLED",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_) | Self::SelfTransfer => 400,
            Self::AccountNotFound(_) | Self::ItemNotFound(_) => 404,
            Self::InsufficientFunds { .. } => 422,
            Self::RetriesExhausted { .. } => 503,
            Self::Cancelled => 499,
            Self::Store(_) => 500,
        }
    }

    /// Returns the stable message shown to the employee.
    ///
    /// Store details never leak into it.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidAmount(_) => "amount must be positive".to_string(),
            Self::SelfTransfer => "cannot transfer coins to yourself".to_string(),
            Self::InsufficientFunds { .. } => "insufficient funds".to_string(),
            Self::AccountNotFound(_) => "account not found".to_string(),
            Self::ItemNotFound(name) => format!("item '{name}' not found"),
            Self::RetriesExhausted { .. } => "operation failed, retry later".to_string(),
            Self::Cancelled => "operation cancelled".to_string(),
            Self::Store(_) => "internal error".to_string(),
        }
    }

    /// Returns `true` if the caller may resubmit the same request later.
    ///
    /// Conflicts are already retried inside the engine; this reports what is
    /// left for the caller after that.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. } | Self::Store(_))
    }

    /// Returns `true` for rejections caused by the request or by the current
    /// balances, as opposed to failures of the engine or the store.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::SelfTransfer
                | Self::InsufficientFunds { .. }
                | Self::AccountNotFound(_)
                | Self::ItemNotFound(_)
        )
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.user_message();
        match err {
            LedgerError::InvalidAmount(_) | LedgerError::SelfTransfer => Self::Validation(message),
            LedgerError::InsufficientFunds { .. } => Self::BusinessRule(message),
            LedgerError::AccountNotFound(_) | LedgerError::ItemNotFound(_) => {
                Self::NotFound(message)
            }
            LedgerError::RetriesExhausted { .. } => Self::Unavailable(message),
            LedgerError::Cancelled => Self::Cancelled(message),
            LedgerError::Store(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::error::Error as _;

    #[test]
    fn test_store_error_display_includes_code() {
        let err = StoreError::new("could not serialize access").with_code("40001");
        assert_eq!(err.to_string(), "could not serialize access (code 40001)");
        assert_eq!(err.code(), Some("40001"));
        assert_eq!(err.message(), "could not serialize access");
    }

    #[test]
    fn test_store_error_keeps_source() {
        let io = std::io::Error::other("socket closed");
        let err = StoreError::new("connection lost").with_source(io);
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("socket closed"));
        assert!(err.code().is_none());
    }

    #[rstest]
    #[case(LedgerError::InvalidAmount(0), "INVALID_AMOUNT", 400)]
    #[case(LedgerError::SelfTransfer, "SELF_TRANSFER", 400)]
    #[case(
        LedgerError::InsufficientFunds { account_id: AccountId::new(), balance: 5, required: 10 },
        "INSUFFICIENT_FUNDS",
        422
    )]
    #[case(LedgerError::AccountNotFound(AccountId::new()), "ACCOUNT_NOT_FOUND", 404)]
    #[case(LedgerError::ItemNotFound("cup".into()), "ITEM_NOT_FOUND", 404)]
    #[case(
        LedgerError::RetriesExhausted { attempts: 3, source: StoreError::new("conflict") },
        "RETRIES_EXHAUSTED",
        503
    )]
    #[case(LedgerError::Cancelled, "CANCELLED", 499)]
    #[case(LedgerError::Store(StoreError::new("down")), "STORE_ERROR", 500)]
    fn test_codes_and_statuses(
        #[case] error: LedgerError,
        #[case] code: &str,
        #[case] status: u16,
    ) {
        assert_eq!(error.error_code(), code);
        assert_eq!(error.http_status_code(), status);
    }

    #[test]
    fn test_exhausted_retries_surface_generic_message() {
        let err = LedgerError::RetriesExhausted {
            attempts: 3,
            source: StoreError::new("could not serialize access").with_code("40001"),
        };
        assert_eq!(err.user_message(), "operation failed, retry later");
        assert_eq!(
            AppError::from(err),
            AppError::Unavailable("operation failed, retry later".into())
        );
    }

    #[test]
    fn test_store_details_do_not_leak() {
        let err = LedgerError::Store(StoreError::new("password authentication failed"));
        assert_eq!(AppError::from(err), AppError::Database("internal error".into()));
    }

    #[test]
    fn test_rejections_map_to_client_errors() {
        assert_eq!(
            AppError::from(LedgerError::SelfTransfer),
            AppError::Validation("cannot transfer coins to yourself".into())
        );
        assert_eq!(
            AppError::from(LedgerError::ItemNotFound("mug".into())),
            AppError::NotFound("item 'mug' not found".into())
        );
        assert!(LedgerError::SelfTransfer.is_rejection());
        assert!(!LedgerError::Cancelled.is_rejection());
    }

    #[test]
    fn test_retryable_matches_transient_app_errors() {
        let errors = [
            LedgerError::InvalidAmount(-1),
            LedgerError::ItemNotFound("x".into()),
            LedgerError::Cancelled,
            LedgerError::RetriesExhausted { attempts: 3, source: StoreError::new("c") },
            LedgerError::Store(StoreError::new("down")),
        ];
        for err in errors {
            let retryable = err.is_retryable();
            assert_eq!(AppError::from(err).is_transient(), retryable);
        }
    }
}
