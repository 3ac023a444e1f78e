//! Common error types for the tax ledger engine

use thiserror::Error;

/// Common result type for tax ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared across the engine
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// External platform unreachable or responded abnormally.
    /// Always non-fatal: the caller skips the affected unit of work.
    #[error("Source unavailable: {0}")]
    Source(String),

    /// A platform response did not match the expected schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller lacks the privileged predicate for an admin operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Persistence engine is contended on a fast read path.
    /// Surfaced to the caller as retryable; never auto-retried here.
    #[error("Store busy, try again shortly")]
    StoreBusy,

    /// Internal engine error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Source(e.to_string())
    }
}

impl Error {
    /// Remap a locked-database error into `StoreBusy` for fast read
    /// paths where the caller is told to retry instead of waiting.
    pub fn busy_on_lock(self) -> Self {
        match &self {
            Error::Database(sqlx::Error::Database(db_err))
                if db_err.message().contains("locked")
                    || db_err.message().contains("busy") =>
            {
                Error::StoreBusy
            }
            _ => self,
        }
    }
}
