// Error types for task validation and persistence

use thiserror::Error;

/// Rejected task text. The collection is never mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a task")]
    Empty,
    #[error("Task is too long (max {max} characters)")]
    TooLong { len: usize, max: usize },
}

/// Failure talking to the key-value backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} available")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}
