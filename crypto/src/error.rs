use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),

    #[error("unsupported code length: {0} digits")]
    UnsupportedDigits(u32),

    #[error("rotation window must be non-zero")]
    ZeroWindow,
}
