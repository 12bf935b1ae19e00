//! Shared Diesel and pool error mapping for the repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map a pool error onto a repository's connection variant.
pub(super) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    let message = match error {
        PoolError::Checkout { message }
        | PoolError::Build { message }
        | PoolError::Migration { message } => message,
    };
    connection(message)
}

/// Failure classes the repositories distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DieselFailure {
    /// The connection dropped mid-operation.
    Connection,
    /// A unique constraint rejected the write.
    UniqueViolation,
    /// Anything else.
    Query,
}

/// Classify a Diesel error, logging the driver detail at `debug`.
pub(super) fn classify(error: &DieselError) -> (DieselFailure, &'static str) {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => (DieselFailure::Query, "record not found"),
        DieselError::QueryBuilderError(_) => (DieselFailure::Query, "database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            (DieselFailure::UniqueViolation, "unique constraint violated")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            (DieselFailure::Connection, "database connection error")
        }
        _ => (DieselFailure::Query, "database error"),
    }
}

/// Map a Diesel error onto query and connection constructors, treating a
/// unique violation as an ordinary query failure.
pub(super) fn map_basic_diesel_error<E>(
    error: DieselError,
    query: impl FnOnce(&'static str) -> E,
    connection: impl FnOnce(&'static str) -> E,
) -> E {
    match classify(&error) {
        (DieselFailure::Connection, message) => connection(message),
        (_, message) => query(message),
    }
}
