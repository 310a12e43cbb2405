//! Error types for fluentorm

use thiserror::Error;

/// Result type alias for fluentorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for query building and persistence
#[derive(Debug, Error)]
pub enum OrmError {
    /// A write or strict id read needs a primary key value that is not there
    #[error("primary key for table '{table}' {detail}")]
    MissingIdentity { table: String, detail: String },

    /// A dynamically dispatched operation name that no capability matches
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// Configuration was read for a connection name that was never set up
    #[error("connection '{0}' is not configured")]
    UnknownConnection(String),

    /// A lazily opened connection has neither a live driver nor a connector
    #[error("connection '{0}' has no driver handle and no connector to open one")]
    MissingConnector(String),

    /// Failure raised by the driver collaborator, passed through unchanged
    #[error("driver error: {0}")]
    Driver(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Validation error
    #[error("validation error: {0}")]
    Validation(String),
}

impl OrmError {
    /// Identity error for a single-column key that is absent or null.
    pub fn identity_missing(table: impl Into<String>) -> Self {
        Self::MissingIdentity {
            table: table.into(),
            detail: "is missing from row or is null".to_string(),
        }
    }

    /// Identity error for a compound key with one or more null parts.
    pub fn identity_partial(table: impl Into<String>) -> Self {
        Self::MissingIdentity {
            table: table.into(),
            detail: "contains null value(s)".to_string(),
        }
    }

    /// Wrap an arbitrary driver failure.
    pub fn driver(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Driver(err.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a missing-identity error
    pub fn is_missing_identity(&self) -> bool {
        matches!(self, Self::MissingIdentity { .. })
    }

    /// Check if this is an unknown-operation error
    pub fn is_unknown_operation(&self) -> bool {
        matches!(self, Self::UnknownOperation(_))
    }

    /// Check if this is an unknown-connection error
    pub fn is_unknown_connection(&self) -> bool {
        matches!(self, Self::UnknownConnection(_))
    }
}
