use presence_store::StoreError;
use presence_types::{TypesError, VenueId, VenueStatus};
use thiserror::Error;

/// Failures of the verification engine.
///
/// A wrong code, an out-of-range fix, an unscoreable receipt and a total
/// below the threshold are *not* errors: they are successful zero-credit
/// results.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("venue {0} not found")]
    VenueNotFound(VenueId),

    #[error("venue {venue} is {status}, verification is not open")]
    VenueNotOpen { venue: VenueId, status: VenueStatus },

    #[error("malformed code: {0}")]
    MalformedCode(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

impl VerificationError {
    /// Whether the caller may resubmit the same request unchanged.
    ///
    /// Only storage outages qualify; commit is idempotent so a resubmission
    /// never double-records.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<StoreError> for VerificationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Immutable(msg) | StoreError::Invalid(msg) => {
                VerificationError::ValidationFailed(msg)
            }
            other => VerificationError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<presence_crypto::CryptoError> for VerificationError {
    fn from(e: presence_crypto::CryptoError) -> Self {
        VerificationError::ValidationFailed(e.to_string())
    }
}

impl From<TypesError> for VerificationError {
    fn from(e: TypesError) -> Self {
        VerificationError::ValidationFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_retryable() {
        assert!(VerificationError::StorageUnavailable("down".into()).is_retryable());
        assert!(!VerificationError::AuthenticationRequired.is_retryable());
        assert!(!VerificationError::MalformedCode("12".into()).is_retryable());
    }

    #[test]
    fn store_errors_map_to_kinds() {
        let e: VerificationError = StoreError::Backend("io".into()).into();
        assert!(matches!(e, VerificationError::StorageUnavailable(_)));
        let e: VerificationError = StoreError::Immutable("location".into()).into();
        assert!(matches!(e, VerificationError::ValidationFailed(_)));
        let e: VerificationError = StoreError::Invalid("range".into()).into();
        assert!(matches!(e, VerificationError::ValidationFailed(_)));
        assert!(!e.is_retryable());
    }
}
