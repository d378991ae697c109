//! Receipt evidence port.
//!
//! Receipt scoring (OCR, merchant matching) lives outside this engine. The
//! engine only relies on the contract: an integer in `[0, RECEIPT_WEIGHT]`, or
//! a typed failure that counts as zero.

use presence_types::{VenueId, RECEIPT_WEIGHT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::VerificationError;

/// What the client uploaded as proof of purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptEvidence {
    /// Location of an uploaded receipt image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Text already extracted on the device.
    #[serde(default)]
    pub text: Option<String>,
}

impl ReceiptEvidence {
    pub fn validate(&self) -> Result<(), VerificationError> {
        let present = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !present(&self.image_url) && !present(&self.text) {
            return Err(VerificationError::ValidationFailed(
                "receipt evidence needs an image_url or text".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ReceiptScoreError {
    #[error("receipt could not be read: {0}")]
    Unreadable(String),

    #[error("receipt scorer unavailable: {0}")]
    Unavailable(String),
}

/// External receipt scorer.
pub trait ReceiptScorer: Send + Sync {
    /// Score evidence for a venue, in `[0, RECEIPT_WEIGHT]`.
    fn score(&self, evidence: &ReceiptEvidence, venue: &VenueId) -> Result<u8, ReceiptScoreError>;
}

/// Outcome of a receipt check. Same shape whether or not it scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptCheck {
    pub score: u8,
    /// `false` when the scorer failed and the score defaulted to zero.
    pub scored: bool,
}

/// Adapts a [`ReceiptScorer`] to the engine's zero-on-failure contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReceiptScoreAdapter;

impl ReceiptScoreAdapter {
    pub fn score(
        &self,
        scorer: &dyn ReceiptScorer,
        evidence: &ReceiptEvidence,
        venue: &VenueId,
    ) -> Result<ReceiptCheck, VerificationError> {
        evidence.validate()?;
        match scorer.score(evidence, venue) {
            Ok(score) if score > RECEIPT_WEIGHT => {
                tracing::warn!(%venue, score, "receipt scorer exceeded weight, clamping");
                Ok(ReceiptCheck {
                    score: RECEIPT_WEIGHT,
                    scored: true,
                })
            }
            Ok(score) => Ok(ReceiptCheck {
                score,
                scored: true,
            }),
            Err(e) => {
                tracing::warn!(%venue, error = %e, "receipt scoring failed, counting as zero");
                Ok(ReceiptCheck {
                    score: 0,
                    scored: false,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<u8, &'static str>);

    impl ReceiptScorer for Fixed {
        fn score(&self, _: &ReceiptEvidence, _: &VenueId) -> Result<u8, ReceiptScoreError> {
            self.0.map_err(|e| ReceiptScoreError::Unavailable(e.into()))
        }
    }

    fn evidence() -> ReceiptEvidence {
        ReceiptEvidence {
            image_url: Some("https://cdn.example/receipts/1.jpg".into()),
            text: None,
        }
    }

    #[test]
    fn passes_through_in_range_score() {
        let check = ReceiptScoreAdapter
            .score(&Fixed(Ok(15)), &evidence(), &VenueId::new("V1"))
            .unwrap();
        assert_eq!(check, ReceiptCheck { score: 15, scored: true });
    }

    #[test]
    fn clamps_over_weight() {
        let check = ReceiptScoreAdapter
            .score(&Fixed(Ok(90)), &evidence(), &VenueId::new("V1"))
            .unwrap();
        assert_eq!(check.score, RECEIPT_WEIGHT);
    }

    #[test]
    fn failure_counts_as_zero() {
        let check = ReceiptScoreAdapter
            .score(&Fixed(Err("timeout")), &evidence(), &VenueId::new("V1"))
            .unwrap();
        assert_eq!(check, ReceiptCheck { score: 0, scored: false });
    }

    #[test]
    fn empty_evidence_is_validation_error() {
        let empty = ReceiptEvidence {
            image_url: Some("  ".into()),
            text: None,
        };
        assert!(matches!(
            ReceiptScoreAdapter.score(&Fixed(Ok(20)), &empty, &VenueId::new("V1")),
            Err(VerificationError::ValidationFailed(_))
        ));
    }
}
