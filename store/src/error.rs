use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),

    #[error("immutable field changed: {0}")]
    Immutable(String),

    /// The value handed to the store is not a valid record.
    #[error("invalid record: {0}")]
    Invalid(String),
}
