//! Check-in engine: connects the verifiers, the aggregator and the ledger into
//! the request-level operations exposed to clients.
//!
//! Every check is request-scoped. Partial checks (`check_*`) score one piece of
//! evidence and write nothing; `commit` re-scores whatever evidence the client
//! presents, aggregates, and hands the result to the ledger.

use std::sync::Arc;

use presence_store::VenueStore;
use presence_types::{
    CheckinRecord, Clock, Coordinate, UserId, Venue, VenueId, VerificationParams, GPS_WEIGHT,
    QR_WEIGHT, RECEIPT_WEIGHT,
};
use presence_utils::format_duration;
use serde::{Deserialize, Serialize};

use crate::code::{CodeCheck, CodeRotationService, DisplayCode};
use crate::events::{CheckinEvent, EventSink};
use crate::geo::{GeoCheck, GeoVerifier, LocationFix};
use crate::ledger::{CheckinLedger, LedgerEffect};
use crate::receipt::{ReceiptCheck, ReceiptEvidence, ReceiptScoreAdapter, ReceiptScorer};
use crate::state::{VerificationAttempt, VerificationPhase};
use crate::VerificationError;

/// Who is asking, as established by the external session service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Caller {
    Guest,
    User(UserId),
}

impl Caller {
    pub fn require_user(&self) -> Result<&UserId, VerificationError> {
        match self {
            Caller::User(user) => Ok(user),
            Caller::Guest => Err(VerificationError::AuthenticationRequired),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCheckResult {
    pub valid: bool,
    pub score: u8,
    pub max_score: u8,
    pub remaining_seconds: u64,
    pub expired: bool,
    pub message: String,
}

impl CodeCheckResult {
    fn from_check(check: CodeCheck) -> Self {
        let message = if check.matched {
            format!(
                "Code verified. It rotates in {}.",
                format_duration(check.remaining_seconds)
            )
        } else if check.expired {
            "This code has expired. Scan the code currently on display.".to_string()
        } else {
            "Code does not match this venue.".to_string()
        };
        Self {
            valid: check.matched,
            score: check.score,
            max_score: QR_WEIGHT,
            remaining_seconds: check.remaining_seconds,
            expired: check.expired,
            message,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationCheckResult {
    pub within_range: bool,
    pub distance_meters: Option<f64>,
    pub score: u8,
    pub max_score: u8,
    pub max_range_meters: f64,
    pub message: String,
}

impl LocationCheckResult {
    fn from_check(check: GeoCheck) -> Self {
        let message = match check.distance_meters {
            None => "No location fix was provided.".to_string(),
            Some(d) if check.within_range => {
                format!("You are {d:.0} m from the venue. Location verified.")
            }
            Some(d) => format!(
                "You are {d:.0} m from the venue. Move within {:.0} m to verify.",
                check.max_range_meters
            ),
        };
        Self {
            within_range: check.within_range,
            distance_meters: check.distance_meters,
            score: check.score,
            max_score: GPS_WEIGHT,
            max_range_meters: check.max_range_meters,
            message,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptCheckResult {
    pub score: u8,
    pub max_score: u8,
    pub scored: bool,
    pub message: String,
}

impl ReceiptCheckResult {
    fn from_check(check: ReceiptCheck) -> Self {
        let message = if !check.scored {
            "The receipt could not be evaluated. You can still verify with location and code."
                .to_string()
        } else if check.score == RECEIPT_WEIGHT {
            "Receipt verified.".to_string()
        } else {
            format!("Receipt scored {} of {}.", check.score, RECEIPT_WEIGHT)
        };
        Self {
            score: check.score,
            max_score: RECEIPT_WEIGHT,
            scored: check.scored,
            message,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    pub has_checked_in: bool,
    pub phase: VerificationPhase,
    pub checkin: Option<CheckinRecord>,
}

/// Evidence presented at commit time. Absent components score zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitRequest {
    #[serde(default)]
    pub location: Option<Coordinate>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub receipt: Option<ReceiptEvidence>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitResult {
    pub record: CheckinRecord,
    pub phase: VerificationPhase,
    /// `true` only for the commit that turned the pair into a pass.
    pub newly_passed: bool,
}

/// Everything the engine needs from the outside world.
pub struct EngineDeps {
    pub venues: Arc<dyn VenueStore>,
    pub checkins: Arc<dyn presence_store::CheckinStore>,
    pub receipts: Arc<dyn ReceiptScorer>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventSink>,
}

pub struct CheckinEngine {
    venues: Arc<dyn VenueStore>,
    ledger: CheckinLedger,
    receipts: Arc<dyn ReceiptScorer>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    geo: GeoVerifier,
    codes: CodeRotationService,
    receipt_adapter: ReceiptScoreAdapter,
}

impl CheckinEngine {
    pub fn new(deps: EngineDeps, params: &VerificationParams) -> Result<Self, VerificationError> {
        Ok(Self {
            venues: deps.venues,
            ledger: CheckinLedger::new(deps.checkins),
            receipts: deps.receipts,
            clock: deps.clock,
            events: deps.events,
            geo: GeoVerifier::new(params.default_max_range_meters),
            codes: CodeRotationService::new(params)?,
            receipt_adapter: ReceiptScoreAdapter,
        })
    }

    fn load_venue(&self, venue_id: &VenueId) -> Result<Venue, VerificationError> {
        self.venues
            .get_venue(venue_id)?
            .ok_or_else(|| VerificationError::VenueNotFound(venue_id.clone()))
    }

    fn load_open_venue(&self, venue_id: &VenueId) -> Result<Venue, VerificationError> {
        let venue = self.load_venue(venue_id)?;
        if !venue.status.accepts_verification() {
            return Err(VerificationError::VenueNotOpen {
                venue: venue.id.clone(),
                status: venue.status,
            });
        }
        Ok(venue)
    }

    /// The code a venue display should show now. For display tooling; no
    /// caller identity involved.
    pub fn display_code(&self, venue_id: &VenueId) -> Result<DisplayCode, VerificationError> {
        let venue = self.load_venue(venue_id)?;
        self.codes
            .current_code(&venue.id, &venue.secret, self.clock.now())
    }

    pub fn check_code(
        &self,
        caller: &Caller,
        venue_id: &VenueId,
        code: &str,
    ) -> Result<CodeCheckResult, VerificationError> {
        let user = caller.require_user()?;
        let venue = self.load_open_venue(venue_id)?;
        let check = self
            .codes
            .verify(code, &venue.id, &venue.secret, self.clock.now())?;
        tracing::debug!(%user, venue = %venue.id, matched = check.matched, expired = check.expired, "code check");
        Ok(CodeCheckResult::from_check(check))
    }

    pub fn check_location(
        &self,
        caller: &Caller,
        venue_id: &VenueId,
        location: Option<Coordinate>,
    ) -> Result<LocationCheckResult, VerificationError> {
        let user = caller.require_user()?;
        let venue = self.load_open_venue(venue_id)?;
        self.score_location(user, &venue, location)
    }

    /// [`Self::check_location`] for a fix that has not been validated yet.
    /// The fix is looked at only once the venue is known to be open.
    pub fn check_location_fix(
        &self,
        caller: &Caller,
        venue_id: &VenueId,
        fix: &LocationFix,
    ) -> Result<LocationCheckResult, VerificationError> {
        let user = caller.require_user()?;
        let venue = self.load_open_venue(venue_id)?;
        self.score_location(user, &venue, fix.resolve()?)
    }

    fn score_location(
        &self,
        user: &UserId,
        venue: &Venue,
        location: Option<Coordinate>,
    ) -> Result<LocationCheckResult, VerificationError> {
        let check = self
            .geo
            .verify(location, venue.location, venue.max_range_meters)?;
        tracing::debug!(%user, venue = %venue.id, distance = ?check.distance_meters, score = check.score, "location check");
        Ok(LocationCheckResult::from_check(check))
    }

    pub fn check_receipt(
        &self,
        caller: &Caller,
        venue_id: &VenueId,
        evidence: &ReceiptEvidence,
    ) -> Result<ReceiptCheckResult, VerificationError> {
        let user = caller.require_user()?;
        let venue = self.load_open_venue(venue_id)?;
        let check = self
            .receipt_adapter
            .score(self.receipts.as_ref(), evidence, &venue.id)?;
        tracing::debug!(%user, venue = %venue.id, score = check.score, scored = check.scored, "receipt check");
        Ok(ReceiptCheckResult::from_check(check))
    }

    /// Guests always get `has_checked_in = false`; storage is not touched.
    pub fn status(
        &self,
        caller: &Caller,
        venue_id: &VenueId,
    ) -> Result<StatusResult, VerificationError> {
        let Caller::User(user) = caller else {
            return Ok(StatusResult {
                has_checked_in: false,
                phase: VerificationPhase::NotStarted,
                checkin: None,
            });
        };
        let checkin = self.ledger.status(user, venue_id)?;
        Ok(StatusResult {
            has_checked_in: checkin.is_some(),
            phase: VerificationPhase::from_record(checkin.as_ref()),
            checkin,
        })
    }

    pub fn commit(
        &self,
        caller: &Caller,
        venue_id: &VenueId,
        request: &CommitRequest,
    ) -> Result<CommitResult, VerificationError> {
        self.commit_with(caller, venue_id, request, || Ok(request.location))
    }

    /// [`Self::commit`] with an unvalidated fix. `request.location` is
    /// ignored; the fix is checked after the venue and before scoring.
    pub fn commit_fix(
        &self,
        caller: &Caller,
        venue_id: &VenueId,
        fix: &LocationFix,
        request: &CommitRequest,
    ) -> Result<CommitResult, VerificationError> {
        self.commit_with(caller, venue_id, request, || fix.resolve())
    }

    fn commit_with(
        &self,
        caller: &Caller,
        venue_id: &VenueId,
        request: &CommitRequest,
        location: impl FnOnce() -> Result<Option<Coordinate>, VerificationError>,
    ) -> Result<CommitResult, VerificationError> {
        let user = caller.require_user()?;
        let venue = self.load_open_venue(venue_id)?;

        let existing = self.ledger.status(user, &venue.id)?;
        if let Some(record) = existing.as_ref() {
            let phase = VerificationPhase::from_record(Some(record));
            if phase.is_terminal() {
                tracing::debug!(%user, venue = %venue.id, "already passed, commit is a no-op");
                return Ok(CommitResult {
                    record: record.clone(),
                    phase,
                    newly_passed: false,
                });
            }
        }

        // Structural problems surface before anything is scored.
        let location = location()?;
        if let Some(code) = &request.code {
            self.codes.normalize(code)?;
        }
        if let Some(receipt) = &request.receipt {
            receipt.validate()?;
        }

        let now = self.clock.now();
        let mut attempt = VerificationAttempt::new();
        if let Some(location) = location {
            let check = self
                .geo
                .verify(Some(location), venue.location, venue.max_range_meters)?;
            attempt.record_gps(check.score);
        }
        if let Some(code) = &request.code {
            let check = self.codes.verify(code, &venue.id, &venue.secret, now)?;
            attempt.record_qr(check.score);
        }
        if let Some(receipt) = &request.receipt {
            let check = self
                .receipt_adapter
                .score(self.receipts.as_ref(), receipt, &venue.id)?;
            attempt.record_receipt(check.score);
        }

        tracing::debug!(%user, venue = %venue.id, phase = ?attempt.phase(existing.as_ref()), "attempt scored");

        let outcome = self
            .ledger
            .record_attempt(user, &venue.id, attempt.scores(), now)?;

        if outcome.effect != LedgerEffect::Unchanged {
            let event = if outcome.record.passed {
                CheckinEvent::Passed {
                    record: outcome.record.clone(),
                }
            } else {
                CheckinEvent::Failed {
                    record: outcome.record.clone(),
                }
            };
            self.events.publish(&event);
        }

        tracing::info!(
            %user,
            venue = %venue.id,
            gps = outcome.record.gps_score,
            qr = outcome.record.qr_score,
            receipt = outcome.record.receipt_score,
            total = outcome.record.total_score,
            passed = outcome.record.passed,
            effect = ?outcome.effect,
            "check-in committed"
        );

        Ok(CommitResult {
            phase: VerificationPhase::from_record(Some(&outcome.record)),
            newly_passed: outcome.newly_passed(),
            record: outcome.record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_has_no_identity() {
        assert!(matches!(
            Caller::Guest.require_user(),
            Err(VerificationError::AuthenticationRequired)
        ));
        let user = UserId::new("u1");
        assert_eq!(Caller::User(user.clone()).require_user().unwrap(), &user);
    }

    #[test]
    fn zero_and_full_credit_share_a_shape() {
        let miss = CodeCheckResult::from_check(CodeCheck {
            matched: false,
            score: 0,
            remaining_seconds: 12,
            expired: true,
        });
        let hit = CodeCheckResult::from_check(CodeCheck {
            matched: true,
            score: QR_WEIGHT,
            remaining_seconds: 12,
            expired: false,
        });
        assert_eq!(miss.max_score, hit.max_score);
        assert!(miss.message.contains("expired"));
        assert!(hit.message.contains("12s"));
    }

    #[test]
    fn location_message_mentions_radius_when_far() {
        let result = LocationCheckResult::from_check(GeoCheck {
            distance_meters: Some(150.4),
            within_range: false,
            score: 0,
            max_range_meters: 100.0,
        });
        assert_eq!(result.message, "You are 150 m from the venue. Move within 100 m to verify.");
        assert_eq!(result.max_score, GPS_WEIGHT);
    }
}
