//! Error types for the catalog system
//!
//! Every failure aborts the seed run; nothing is recovered locally. The
//! variants map onto three operator-facing categories (validation,
//! referential, persistence) plus configuration problems found before any
//! connection is made.

use std::fmt;

/// Result type alias for catalog operations
pub type SeedResult<T> = Result<T, SeedError>;

/// Error types for catalog and seeding operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    /// A definition violates a non-empty or uniqueness rule
    #[error("Validation error: {0}")]
    Validation(String),

    /// A parameter names a template that was never created in this batch
    #[error("Parameter '{parameter}' references unknown template {reference}")]
    UnresolvedTemplate { parameter: String, reference: String },

    /// The storage layer rejected a statement
    #[error("Database error: {0}")]
    Database(String),

    /// The storage layer could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Begin, commit or rollback failed
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Seeding was refused for the selected environment
    #[error("Environment '{0}' is not safe for automatic seeding. Use explicit opt-in.")]
    UnsafeEnvironment(String),
}

/// Operator-facing classification of a [`SeedError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Referential,
    Persistence,
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Referential => write!(f, "referential"),
            ErrorCategory::Persistence => write!(f, "persistence"),
            ErrorCategory::Configuration => write!(f, "configuration"),
        }
    }
}

impl SeedError {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            SeedError::Validation(_) => ErrorCategory::Validation,
            SeedError::UnresolvedTemplate { .. } => ErrorCategory::Referential,
            SeedError::Database(_) | SeedError::Connection(_) | SeedError::Transaction(_) => {
                ErrorCategory::Persistence
            }
            SeedError::Configuration(_) | SeedError::UnsafeEnvironment(_) => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn is_referential(&self) -> bool {
        self.category() == ErrorCategory::Referential
    }
}

// Convert from sqlx errors
impl From<sqlx::Error> for SeedError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                SeedError::Connection(err.to_string())
            }
            other => SeedError::Database(other.to_string()),
        }
    }
}

impl From<url::ParseError> for SeedError {
    fn from(err: url::ParseError) -> Self {
        SeedError::Configuration(format!("Invalid database URL: {}", err))
    }
}
