//! Rotating venue codes.
//!
//! A venue display shows `digits` decimal digits derived from the venue secret
//! and the current time window. The display and the server derive the same code
//! independently; nothing is stored and nothing is consumed. Many visitors read
//! the same code, so per-user uniqueness is the ledger's concern.
//!
//! The current window and the one before it are accepted. A well-formed code
//! that matches one of the `expired_lookback` windows before that is reported
//! as `expired`, anything else as a plain mismatch.

use presence_crypto::{codes_equal, derive_code, time_bucket};
use presence_types::{Timestamp, VenueId, VenueSecret, VerificationParams, QR_WEIGHT};
use serde::{Deserialize, Serialize};

use crate::VerificationError;

/// The code a venue should be displaying right now.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayCode {
    pub code: String,
    pub remaining_seconds: u64,
}

/// Outcome of checking a submitted code. Same shape whether or not it matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCheck {
    pub matched: bool,
    pub score: u8,
    pub remaining_seconds: u64,
    pub expired: bool,
}

#[derive(Clone, Debug)]
pub struct CodeRotationService {
    digits: u32,
    window_secs: u64,
    expired_lookback: u32,
}

impl CodeRotationService {
    pub fn new(params: &VerificationParams) -> Result<Self, VerificationError> {
        params.validate()?;
        Ok(Self {
            digits: params.code_digits,
            window_secs: params.code_window_secs,
            expired_lookback: params.expired_lookback,
        })
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// Seconds until the current window ends.
    pub fn remaining_seconds(&self, now: Timestamp) -> u64 {
        self.window_secs - (now.as_secs() % self.window_secs)
    }

    fn code_for_bucket(
        &self,
        venue: &VenueId,
        secret: &VenueSecret,
        bucket: u64,
    ) -> Result<String, VerificationError> {
        Ok(derive_code(
            secret.as_bytes(),
            venue.as_bytes(),
            bucket,
            self.digits,
        )?)
    }

    pub fn current_code(
        &self,
        venue: &VenueId,
        secret: &VenueSecret,
        now: Timestamp,
    ) -> Result<DisplayCode, VerificationError> {
        let bucket = time_bucket(now.as_secs(), self.window_secs)?;
        Ok(DisplayCode {
            code: self.code_for_bucket(venue, secret, bucket)?,
            remaining_seconds: self.remaining_seconds(now),
        })
    }

    /// Structural check, done before any HMAC work.
    ///
    /// Surrounding whitespace from scanners and keyboards is ignored.
    pub fn normalize<'a>(&self, submitted: &'a str) -> Result<&'a str, VerificationError> {
        let code = submitted.trim();
        if code.len() != self.digits as usize {
            return Err(VerificationError::MalformedCode(format!(
                "expected {} digits, got {} characters",
                self.digits,
                code.chars().count()
            )));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VerificationError::MalformedCode(
                "code must be numeric".into(),
            ));
        }
        Ok(code)
    }

    pub fn verify(
        &self,
        submitted: &str,
        venue: &VenueId,
        secret: &VenueSecret,
        now: Timestamp,
    ) -> Result<CodeCheck, VerificationError> {
        let code = self.normalize(submitted)?;
        let current = time_bucket(now.as_secs(), self.window_secs)?;
        let remaining_seconds = self.remaining_seconds(now);

        let hits = |back: u64| -> Result<bool, VerificationError> {
            match current.checked_sub(back) {
                Some(bucket) => Ok(codes_equal(
                    code,
                    &self.code_for_bucket(venue, secret, bucket)?,
                )),
                None => Ok(false),
            }
        };

        // Evaluate both accepted windows so timing does not reveal which one hit.
        let in_current = hits(0)?;
        let in_grace = hits(1)?;
        if in_current || in_grace {
            return Ok(CodeCheck {
                matched: true,
                score: QR_WEIGHT,
                remaining_seconds,
                expired: false,
            });
        }

        let mut expired = false;
        for back in 2..2 + self.expired_lookback as u64 {
            expired |= hits(back)?;
        }
        Ok(CodeCheck {
            matched: false,
            score: 0,
            remaining_seconds,
            expired,
        })
    }
}

impl Default for CodeRotationService {
    fn default() -> Self {
        let params = VerificationParams::default();
        Self {
            digits: params.code_digits,
            window_secs: params.code_window_secs,
            expired_lookback: params.expired_lookback,
        }
    }
}
