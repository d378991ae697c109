//! Exactly-once check-in persistence.
//!
//! The ledger is the only stateful component. It never takes locks of its own:
//! every decision that must be atomic is a single store operation
//! ([`CheckinStore::insert_or_get`] or [`CheckinStore::replace_failed`]).

use std::sync::Arc;

use presence_store::{CheckinStore, InsertOutcome, ReplaceOutcome};
use presence_types::{CheckinRecord, ComponentScores, Timestamp, UserId, VenueId};

use crate::aggregator::VerificationAggregator;
use crate::VerificationError;

/// What a call to [`CheckinLedger::record_attempt`] did to storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerEffect {
    /// First record for the pair was written by this call.
    Inserted,
    /// A failed record was replaced by this call.
    Superseded,
    /// Nothing was written: the record is passed, or a concurrent call won.
    Unchanged,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerOutcome {
    pub record: CheckinRecord,
    pub effect: LedgerEffect,
}

impl LedgerOutcome {
    /// Whether this call is the one that turned the pair into a pass.
    pub fn newly_passed(&self) -> bool {
        self.record.passed && self.effect != LedgerEffect::Unchanged
    }
}

pub struct CheckinLedger {
    store: Arc<dyn CheckinStore>,
    aggregator: VerificationAggregator,
}

impl CheckinLedger {
    pub fn new(store: Arc<dyn CheckinStore>) -> Self {
        Self {
            store,
            aggregator: VerificationAggregator,
        }
    }

    pub fn status(
        &self,
        user: &UserId,
        venue: &VenueId,
    ) -> Result<Option<CheckinRecord>, VerificationError> {
        Ok(self.store.get_checkin(venue, user)?)
    }

    /// Persist an attempt for `(user, venue)`.
    ///
    /// - no record: insert; if a concurrent call inserted first, its record is
    ///   returned instead and this attempt is dropped;
    /// - passed record: returned unchanged;
    /// - failed record: replaced, unless it changed underneath us, in which
    ///   case the record that won is returned.
    pub fn record_attempt(
        &self,
        user: &UserId,
        venue: &VenueId,
        scores: ComponentScores,
        now: Timestamp,
    ) -> Result<LedgerOutcome, VerificationError> {
        let aggregate = self.aggregator.aggregate(&scores)?;
        let build = |id| CheckinRecord {
            id,
            user_id: user.clone(),
            venue_id: venue.clone(),
            gps_score: scores.gps_score,
            qr_score: scores.qr_score,
            receipt_score: scores.receipt_score,
            total_score: aggregate.total_score,
            passed: aggregate.passed,
            verified_at: now,
        };

        let outcome = match self.store.get_checkin(venue, user)? {
            Some(existing) if existing.passed => LedgerOutcome {
                record: existing,
                effect: LedgerEffect::Unchanged,
            },
            Some(existing) => {
                // The row keeps its identity across superseding attempts.
                let next = build(existing.id);
                match self.store.replace_failed(&existing, &next)? {
                    ReplaceOutcome::Replaced(record) => LedgerOutcome {
                        record,
                        effect: LedgerEffect::Superseded,
                    },
                    ReplaceOutcome::Stale(record) => LedgerOutcome {
                        record,
                        effect: LedgerEffect::Unchanged,
                    },
                }
            }
            None => {
                let first = build(presence_crypto::checkin_id(venue, user, now));
                match self.store.insert_or_get(&first)? {
                    InsertOutcome::Inserted(record) => LedgerOutcome {
                        record,
                        effect: LedgerEffect::Inserted,
                    },
                    InsertOutcome::Existing(record) => LedgerOutcome {
                        record,
                        effect: LedgerEffect::Unchanged,
                    },
                }
            }
        };

        tracing::debug!(
            %user,
            %venue,
            total = outcome.record.total_score,
            passed = outcome.record.passed,
            effect = ?outcome.effect,
            "recorded check-in attempt"
        );
        Ok(outcome)
    }
}
