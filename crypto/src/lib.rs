//! Cryptographic primitives for the presence check-in engine.
//!
//! - **HMAC-SHA256** time-bucketed one-time codes for venue displays
//! - **Blake2b** for check-in identifiers

pub mod error;
pub mod hash;
pub mod otp;

pub use error::CryptoError;
pub use hash::{blake2b_256, blake2b_256_multi, checkin_id};
pub use otp::{codes_equal, derive_code, time_bucket};
