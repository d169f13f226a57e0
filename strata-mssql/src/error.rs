//! Error types for Microsoft SQL Server operations.

use strata_core::StrataError;
use thiserror::Error;

/// Result type for MSSQL operations.
pub type MssqlResult<T> = Result<T, MssqlError>;

/// Errors that can occur during MSSQL operations.
#[derive(Error, Debug)]
pub enum MssqlError {
    /// Tiberius/SQL Server error.
    #[error("sql server error: {0}")]
    SqlServer(#[from] tiberius::error::Error),

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

impl MssqlError {
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

impl From<MssqlError> for StrataError {
    fn from(err: MssqlError) -> Self {
        match err {
            // Keep the server's message text intact; duplicate-key
            // classification matches on it upstream.
            MssqlError::SqlServer(e) => StrataError::Query(e.to_string()),
            MssqlError::Config(msg) => StrataError::Config(msg),
            MssqlError::Connection(msg) => StrataError::ConnectionFailed(msg),
            MssqlError::Transaction(msg) => StrataError::Transaction(msg),
            MssqlError::Query(msg) => StrataError::Query(msg),
            MssqlError::TypeConversion(msg) => StrataError::TypeConversion(msg),
        }
    }
}
