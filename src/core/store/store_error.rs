// Shared storage error for every store port.
//
// Duplicate keys and missing records are NOT errors here: the ports report
// them as `false` / `None`. A `StoreError` always means the backend itself
// failed (connection dropped, bad SQL, corrupt JSON column).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}
