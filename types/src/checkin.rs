//! Component scores and the durable check-in record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::params::{GPS_WEIGHT, PASS_THRESHOLD, QR_WEIGHT, RECEIPT_WEIGHT};
use crate::{Timestamp, TypesError, UserId, VenueId};

/// A 32-byte check-in identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CheckinId([u8; 32]);

impl CheckinId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for CheckinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CheckinId(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for CheckinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Partial credit gathered for one (user, venue) pair.
///
/// A component that was never attempted is simply `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentScores {
    pub gps_score: u8,
    pub qr_score: u8,
    pub receipt_score: u8,
}

impl ComponentScores {
    pub fn new(gps_score: u8, qr_score: u8, receipt_score: u8) -> Self {
        Self {
            gps_score,
            qr_score,
            receipt_score,
        }
    }

    pub fn total(&self) -> u8 {
        self.gps_score
            .saturating_add(self.qr_score)
            .saturating_add(self.receipt_score)
    }

    /// Whether every component is within its weight.
    pub fn is_within_weights(&self) -> bool {
        self.gps_score <= GPS_WEIGHT
            && self.qr_score <= QR_WEIGHT
            && self.receipt_score <= RECEIPT_WEIGHT
    }
}

/// The durable outcome of a check-in. At most one exists per (user, venue).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinRecord {
    pub id: CheckinId,
    pub user_id: UserId,
    pub venue_id: VenueId,
    pub gps_score: u8,
    pub qr_score: u8,
    pub receipt_score: u8,
    pub total_score: u8,
    pub passed: bool,
    pub verified_at: Timestamp,
}

impl CheckinRecord {
    pub fn scores(&self) -> ComponentScores {
        ComponentScores::new(self.gps_score, self.qr_score, self.receipt_score)
    }

    /// Check the derived fields against the component scores.
    ///
    /// Called on every record read back from storage.
    pub fn validate(&self) -> Result<(), TypesError> {
        let scores = self.scores();
        if !scores.is_within_weights() {
            return Err(TypesError::InconsistentRecord(format!(
                "component score above weight: {scores:?}"
            )));
        }
        if self.total_score != scores.total() {
            return Err(TypesError::InconsistentRecord(format!(
                "total {} != component sum {}",
                self.total_score,
                scores.total()
            )));
        }
        if self.passed != (self.total_score >= PASS_THRESHOLD) {
            return Err(TypesError::InconsistentRecord(format!(
                "passed={} disagrees with total {}",
                self.passed, self.total_score
            )));
        }
        Ok(())
    }
}
