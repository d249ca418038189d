//! Error types for prequel

use std::time::Duration;
use thiserror::Error;

/// Result type alias for statement building
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type alias for executing statements
pub type PrequelResult<T> = Result<T, PrequelError>;

/// Errors produced while turning a builder tree into SQL.
///
/// All of them are deterministic: the same builder input fails the same way
/// every time, and no partial SQL or parameters are ever returned with them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A quoted literal in a fragment is never closed.
    #[error("missing closing quote")]
    MissingClosingQuote,

    /// `$` is not followed by any digit.
    #[error("invalid placeholder")]
    InvalidPlaceholder,

    /// `$N` refers outside of the parameters supplied with the fragment.
    #[error("invalid placeholder index: {0}")]
    InvalidPlaceholderIndex(String),

    /// A sequence bound to an IN-style placeholder has no elements.
    #[error("empty slice passed as 'IN' parameter")]
    EmptySliceParameter,

    /// A clause fragment is blank.
    #[error("empty expression")]
    EmptyExpressionText,

    /// Renumbering was asked to start below `$1`.
    #[error("start index should be >= 1")]
    NegativeOrZeroStartIndex,

    /// A WITH entry has a blank name.
    #[error("empty query name")]
    EmptyQueryName,

    /// A statement-specific mandatory part is missing (table, columns, ...).
    #[error("empty {0}")]
    MissingRequiredField(&'static str),

    /// Column count and value count disagree.
    #[error("invalid number of values, expected {expected}, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    /// ON CONFLICT target/action combination is not valid.
    #[error("invalid ON CONFLICT clause: {0}")]
    ConflictConfiguration(&'static str),

    /// Two clauses were set that cannot appear in the same statement.
    #[error("incompatible clauses: {0}")]
    IncompatibleClauses(&'static str),
}

/// Error types for running built statements
#[derive(Debug, Error)]
pub enum PrequelError {
    /// The statement could not be built
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl PrequelError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a build error
    pub fn is_build(&self) -> bool {
        matches!(self, Self::Build(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Parse a tokio_postgres error into a more specific PrequelError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for PrequelError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
