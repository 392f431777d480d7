use std::path::PathBuf;

/// Errors from value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be parsed or written as JSON.
    #[error("serialization error in {path}: {reason}")]
    Serialization { path: PathBuf, reason: String },

    /// A stored value does not fit the expected range.
    #[error("corrupt value for {key}: {value}")]
    CorruptValue { key: String, value: i64 },

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
