//! Nullable receipt scorer.

use presence_types::VenueId;
use presence_verification::{ReceiptEvidence, ReceiptScoreError, ReceiptScorer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

enum Behavior {
    Score(u8),
    Unreadable,
    Unavailable,
}

/// Returns a programmed score (or failure) for every receipt, and counts calls.
pub struct NullReceiptScorer {
    behavior: Mutex<Behavior>,
    calls: AtomicUsize,
}

impl NullReceiptScorer {
    pub fn scoring(score: u8) -> Self {
        Self::with(Behavior::Score(score))
    }

    pub fn unreadable() -> Self {
        Self::with(Behavior::Unreadable)
    }

    pub fn unavailable() -> Self {
        Self::with(Behavior::Unavailable)
    }

    fn with(behavior: Behavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_score(&self, score: u8) {
        *self.behavior.lock().unwrap() = Behavior::Score(score);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for NullReceiptScorer {
    fn default() -> Self {
        Self::scoring(0)
    }
}

impl ReceiptScorer for NullReceiptScorer {
    fn score(&self, _evidence: &ReceiptEvidence, venue: &VenueId) -> Result<u8, ReceiptScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.behavior.lock().unwrap() {
            Behavior::Score(score) => Ok(score),
            Behavior::Unreadable => Err(ReceiptScoreError::Unreadable(format!(
                "null scorer rejects receipts for {venue}"
            ))),
            Behavior::Unavailable => Err(ReceiptScoreError::Unavailable("null scorer offline".into())),
        }
    }
}
