use thiserror::Error;

/// Result type for pgq-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error type for heterogeneous error sources
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error types for pgq-client operations.
///
/// Errors are returned synchronously to the immediate caller; nothing is
/// retried or recovered internally.
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection failed or was lost
    #[error("Database connection failed: {source}. Context: {context}")]
    ConnectionFailed { source: BoxError, context: String },

    /// SQL query failed
    #[error("Database query failed: {query}. Context: {context}. Source: {source}")]
    QueryFailed {
        source: BoxError,
        query: String,
        context: String,
    },

    /// Row shape mismatch or column conversion failure
    #[error("Error while scanning row: {message}")]
    Scan { message: String },

    /// Transaction begin or commit failed
    #[error("Database transaction failed: {source}. Context: {context}")]
    TransactionFailed { source: BoxError, context: String },

    /// Rollback failed after an earlier error. Both errors are surfaced:
    /// `cause` is what triggered the rollback, `source` is the rollback
    /// failure itself.
    #[error("Rollback failed: {source}. Original error: {cause}")]
    RollbackFailed { source: BoxError, cause: Box<Error> },

    /// Required configuration field is missing
    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    /// Configuration field has an invalid value
    #[error("Invalid configuration value for {field}: {message}")]
    InvalidConfig { field: String, message: String },
}
