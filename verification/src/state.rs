//! Verification progress for one (user, venue) pair.

use presence_types::{CheckinRecord, ComponentScores};
use serde::{Deserialize, Serialize};

/// Where a (user, venue) pair stands.
///
/// `NotStarted → Verifying → Passed | Failed`. `Failed` returns to
/// `Verifying` on the next attempt; `Passed` never changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPhase {
    /// No evidence submitted and nothing committed.
    NotStarted,
    /// Evidence is being gathered.
    Verifying,
    /// A committed attempt reached the threshold. Terminal.
    Passed,
    /// The last committed attempt fell short.
    Failed,
}

impl VerificationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Phase implied by the stored record, if any.
    pub fn from_record(record: Option<&CheckinRecord>) -> Self {
        match record {
            None => Self::NotStarted,
            Some(r) if r.passed => Self::Passed,
            Some(_) => Self::Failed,
        }
    }
}

/// Component scores known so far within one request.
///
/// Never persisted on its own and never shared across requests. A component
/// that was not attempted counts as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerificationAttempt {
    gps_score: Option<u8>,
    qr_score: Option<u8>,
    receipt_score: Option<u8>,
}

impl VerificationAttempt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_gps(&mut self, score: u8) {
        self.gps_score = Some(score);
    }

    pub fn record_qr(&mut self, score: u8) {
        self.qr_score = Some(score);
    }

    pub fn record_receipt(&mut self, score: u8) {
        self.receipt_score = Some(score);
    }

    pub fn is_empty(&self) -> bool {
        self.gps_score.is_none() && self.qr_score.is_none() && self.receipt_score.is_none()
    }

    pub fn scores(&self) -> ComponentScores {
        ComponentScores::new(
            self.gps_score.unwrap_or(0),
            self.qr_score.unwrap_or(0),
            self.receipt_score.unwrap_or(0),
        )
    }

    /// Phase of the pair given this attempt and what is already stored.
    pub fn phase(&self, stored: Option<&CheckinRecord>) -> VerificationPhase {
        match VerificationPhase::from_record(stored) {
            VerificationPhase::Passed => VerificationPhase::Passed,
            _ if !self.is_empty() => VerificationPhase::Verifying,
            other => other,
        }
    }
}
