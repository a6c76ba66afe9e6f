//! Core error types for the custody engine.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the custody engine.
///
/// Database-specific errors are wrapped in string form to keep this type
/// database-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Custody calculation failed: {0}")]
    Custody(#[from] CustodyError),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Whether the caller may retry the whole request unchanged.
    ///
    /// Only transient I/O against the ledger mirror or the database qualifies;
    /// bad input and configuration errors do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Custody(CustodyError::MirrorUnavailable(_)) => true,
            Error::Database(db) => matches!(
                db,
                DatabaseError::ConnectionFailed(_)
                    | DatabaseError::PoolCreationFailed(_)
                    | DatabaseError::QueryFailed(_)
                    | DatabaseError::TransactionFailed(_)
            ),
            _ => false,
        }
    }

    /// Short, stable name of the error kind, used as the `code` of report envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Database(_) => "DatabaseError",
            Error::Validation(_) => "ValidationError",
            Error::Custody(e) => e.code(),
            Error::InvalidConfigValue(_) => "InvalidConfigValue",
            Error::Repository(_) => "RepositoryError",
            Error::Unexpected(_) => "UnexpectedError",
        }
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Errors raised while accruing custody fees and assets under custody.
///
/// `InvalidFeeFraction`, `BillingNotFound`, `ControlPointRegression` and
/// `AccrualOverflow` are scoped to one (account, asset) pair and never abort
/// a report on their own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CustodyError {
    #[error("Fee fraction should be in (0, 1], got {0}")]
    InvalidFeeFraction(Decimal),

    #[error("No custody billing rate configured for asset {asset_id} in scope {scope_account_id}")]
    BillingNotFound {
        scope_account_id: String,
        asset_id: String,
    },

    #[error("Report window is empty or inverted: from={from}, to={to}")]
    InvalidWindow { from: i64, to: i64 },

    #[error("Settlement at {settle_at} precedes control point {control_timestamp}")]
    ControlPointRegression {
        control_timestamp: i64,
        settle_at: i64,
    },

    #[error("Accrual interval must be positive, got elapsed={elapsed} over {total_window}")]
    InvalidAccrualInterval { total_window: i64, elapsed: i64 },

    #[error("Accrual arithmetic overflowed: {0}")]
    AccrualOverflow(String),

    #[error("Ledger mirror unavailable: {0}")]
    MirrorUnavailable(String),

    #[error("Failed to persist accrual snapshot: {0}")]
    SnapshotWriteFailure(String),
}

impl CustodyError {
    pub fn code(&self) -> &'static str {
        match self {
            CustodyError::InvalidFeeFraction(_) => "InvalidFeeFraction",
            CustodyError::BillingNotFound { .. } => "BillingNotFound",
            CustodyError::InvalidWindow { .. } => "InvalidWindow",
            CustodyError::ControlPointRegression { .. } => "ControlPointRegression",
            CustodyError::InvalidAccrualInterval { .. } => "InvalidAccrualInterval",
            CustodyError::AccrualOverflow(_) => "AccrualOverflow",
            CustodyError::MirrorUnavailable(_) => "MirrorUnavailable",
            CustodyError::SnapshotWriteFailure(_) => "SnapshotWriteFailure",
        }
    }

    /// Errors that only remove one asset from one account's result.
    pub fn is_asset_scoped(&self) -> bool {
        matches!(
            self,
            CustodyError::InvalidFeeFraction(_)
                | CustodyError::BillingNotFound { .. }
                | CustodyError::ControlPointRegression { .. }
                | CustodyError::AccrualOverflow(_)
        )
    }
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
