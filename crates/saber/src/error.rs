//! Error types for saber persistence.

use thiserror::Error;

/// Result type for key-value store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`KeyValueStore`](crate::store::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key cannot be mapped to a storage location.
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    /// Value could not be encoded.
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
