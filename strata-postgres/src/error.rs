//! Error types for PostgreSQL operations.

use strata_core::StrataError;
use thiserror::Error;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur during PostgreSQL operations.
#[derive(Error, Debug)]
pub enum PgError {
    /// tokio-postgres driver error.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Transaction state machine misuse.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Query execution error.
    #[error("query error: {0}")]
    Query(String),

    /// Value conversion error.
    #[error("type conversion error: {0}")]
    TypeConversion(String),
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a transaction error.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<PgError> for StrataError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Postgres(e) => {
                // Keep the driver's message text intact; duplicate-key
                // classification matches on it upstream.
                let message = match e.as_db_error() {
                    Some(db) => db.message().to_string(),
                    None => e.to_string(),
                };
                StrataError::Query(message)
            }
            PgError::Config(msg) => StrataError::Config(msg),
            PgError::Connection(msg) => StrataError::ConnectionFailed(msg),
            PgError::Transaction(msg) => StrataError::Transaction(msg),
            PgError::Query(msg) => StrataError::Query(msg),
            PgError::TypeConversion(msg) => StrataError::TypeConversion(msg),
        }
    }
}
