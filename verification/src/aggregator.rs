//! Weighted pass/fail decision over the component scores.

use presence_types::{ComponentScores, PASS_THRESHOLD};
use serde::{Deserialize, Serialize};

use crate::state::VerificationPhase;
use crate::VerificationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub total_score: u8,
    pub passed: bool,
}

impl Aggregate {
    pub fn phase(&self) -> VerificationPhase {
        if self.passed {
            VerificationPhase::Passed
        } else {
            VerificationPhase::Failed
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct VerificationAggregator;

impl VerificationAggregator {
    /// Sum the components and compare against [`PASS_THRESHOLD`] (inclusive).
    ///
    /// Any two full-credit components clear the threshold; the receipt is
    /// optional.
    pub fn aggregate(&self, scores: &ComponentScores) -> Result<Aggregate, VerificationError> {
        if !scores.is_within_weights() {
            return Err(VerificationError::ValidationFailed(format!(
                "component score above its weight: {scores:?}"
            )));
        }
        let total_score = scores.total();
        Ok(Aggregate {
            total_score,
            passed: total_score >= PASS_THRESHOLD,
        })
    }
}
