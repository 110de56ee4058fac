/// Error types for the credential store
use thiserror::Error;

/// Credential store error type
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be created
    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    /// The store lock was poisoned by a panicking holder
    #[error("Credential store lock poisoned")]
    LockPoisoned,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
