//! Error types shared by every Strata provider.

use thiserror::Error;

use crate::types::DbType;

/// Result type for Strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;

/// Errors that can occur while talking to a database through a provider.
#[derive(Error, Debug)]
pub enum StrataError {
    /// The physical connection could not be opened or has gone away.
    #[error("could not open connection: {0}")]
    ConnectionFailed(String),

    /// A logical type outside the supported set was used where a native
    /// mapping is required.
    #[error("data type not supported: {0}")]
    TypeNotSupported(DbType),

    /// An insert violated a uniqueness constraint.
    #[error("duplicate key on {table}: {message}")]
    DuplicateKey { table: String, message: String },

    /// An insert failed for a reason other than a duplicate key.
    #[error("failed to add record to {table}")]
    WriteFailed {
        table: String,
        #[source]
        source: Box<StrataError>,
    },

    /// A blob read was attempted on a reader that was not opened in
    /// sequential-access mode.
    #[error("sequential access mode is required for blob reads")]
    SequentialAccessRequired,

    /// The operation is not supported by this backend.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Transaction state machine misuse or failure.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Query construction or execution error.
    #[error("query error: {0}")]
    Query(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Value could not be converted between representations.
    #[error("type conversion error: {0}")]
    TypeConversion(String),
}

impl StrataError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a transaction error.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion(message.into())
    }

    /// Create a not-implemented error.
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::NotImplemented(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }

    /// Check if this is a duplicate-key violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// Check if this is an unsupported-type error.
    pub fn is_type_not_supported(&self) -> bool {
        matches!(self, Self::TypeNotSupported(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StrataError::config("missing connection string");
        assert!(matches!(err, StrataError::Config(_)));

        let err = StrataError::connection("connection refused");
        assert!(err.is_connection_error());

        let err = StrataError::TypeNotSupported(DbType::SqlVariant);
        assert!(err.is_type_not_supported());
    }

    #[test]
    fn test_error_display() {
        let err = StrataError::query("bad statement");
        assert_eq!(err.to_string(), "query error: bad statement");

        let err = StrataError::DuplicateKey {
            table: "Users".to_string(),
            message: "duplicate key".to_string(),
        };
        assert!(err.is_duplicate_key());
        assert_eq!(err.to_string(), "duplicate key on Users: duplicate key");
    }

    #[test]
    fn test_write_failed_carries_cause() {
        let cause = StrataError::query("violation");
        let err = StrataError::WriteFailed {
            table: "Users".to_string(),
            source: Box::new(cause),
        };
        assert_eq!(err.to_string(), "failed to add record to Users");
        assert!(std::error::Error::source(&err).is_some());
    }
}
