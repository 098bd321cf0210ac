//! Mapping of `SeaORM` errors onto store errors.
//!
//! PostgreSQL reports serializable-isolation failures with SQLSTATE `40001`.
//! The code is lifted out of the driver error and attached to the
//! `StoreError`, so classification never inspects message text.

use merchledger_core::ledger::StoreError;
use sea_orm::{DbErr, RuntimeErr};

/// SQLSTATE for `serialization_failure`.
pub const SERIALIZATION_FAILURE: &str = "40001";

/// Extracts the SQLSTATE of a database-side error, if there is one.
#[must_use]
pub fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Converts a `DbErr` into a `StoreError` carrying its SQLSTATE.
#[must_use]
pub fn store_error(err: DbErr) -> StoreError {
    let mut store = StoreError::new(err.to_string());
    if let Some(code) = sqlstate(&err) {
        store = store.with_code(code);
    }
    store.with_source(err)
}

/// Returns `true` if the error is a PostgreSQL serialization failure.
#[must_use]
pub fn is_serialization_failure(err: &StoreError) -> bool {
    err.code() == Some(SERIALIZATION_FAILURE)
}
