//! Scoring weights and tunable verification parameters.
//!
//! The weights and the pass threshold are fixed: they define what a presence
//! proof *is*. Code length, rotation window and GPS radius are deployment
//! parameters.

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// Credit for a location fix inside the venue radius.
pub const GPS_WEIGHT: u8 = 40;
/// Credit for a rotating code that matches an accepted window.
pub const QR_WEIGHT: u8 = 40;
/// Maximum credit for receipt evidence.
pub const RECEIPT_WEIGHT: u8 = 20;
/// Sum of all component weights.
pub const MAX_TOTAL_SCORE: u8 = GPS_WEIGHT + QR_WEIGHT + RECEIPT_WEIGHT;
/// Minimum total score for a check-in to pass (inclusive).
pub const PASS_THRESHOLD: u8 = 60;

/// Deployment-tunable parameters for the verification components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationParams {
    /// Number of digits shown on the venue display.
    #[serde(default = "default_code_digits")]
    pub code_digits: u32,

    /// Seconds each code stays current.
    #[serde(default = "default_code_window_secs")]
    pub code_window_secs: u64,

    /// Windows before the grace window that still report `expired` rather
    /// than a plain mismatch.
    #[serde(default = "default_expired_lookback")]
    pub expired_lookback: u32,

    /// GPS radius used when a venue does not set its own.
    #[serde(default = "default_max_range_meters")]
    pub default_max_range_meters: f64,
}

fn default_code_digits() -> u32 {
    6
}

fn default_code_window_secs() -> u64 {
    30
}

fn default_expired_lookback() -> u32 {
    2
}

fn default_max_range_meters() -> f64 {
    100.0
}

impl Default for VerificationParams {
    fn default() -> Self {
        Self {
            code_digits: default_code_digits(),
            code_window_secs: default_code_window_secs(),
            expired_lookback: default_expired_lookback(),
            default_max_range_meters: default_max_range_meters(),
        }
    }
}

impl VerificationParams {
    pub fn validate(&self) -> Result<(), TypesError> {
        if !(4..=9).contains(&self.code_digits) {
            return Err(TypesError::InvalidParams(format!(
                "code_digits must be in 4..=9, got {}",
                self.code_digits
            )));
        }
        if self.code_window_secs == 0 {
            return Err(TypesError::InvalidParams(
                "code_window_secs must be non-zero".into(),
            ));
        }
        if !self.default_max_range_meters.is_finite() || self.default_max_range_meters <= 0.0 {
            return Err(TypesError::InvalidParams(format!(
                "default_max_range_meters must be positive, got {}",
                self.default_max_range_meters
            )));
        }
        Ok(())
    }
}
