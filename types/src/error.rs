//! Validation errors for the fundamental types.

use thiserror::Error;

/// Raised when a value cannot be turned into one of the typed domain records.
#[derive(Debug, Error, PartialEq)]
pub enum TypesError {
    #[error("invalid {kind} id: {reason}")]
    InvalidId { kind: &'static str, reason: String },

    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("venue secret too short: {len} bytes, need at least {min}")]
    WeakSecret { len: usize, min: usize },

    #[error("inconsistent check-in record: {0}")]
    InconsistentRecord(String),

    #[error("invalid verification parameters: {0}")]
    InvalidParams(String),
}
