//! Triple Verification check-in engine.
//!
//! Three weak signals become one presence proof:
//! 1. **Location**: the device fix is inside the venue radius (binary credit).
//! 2. **Code**: the device read the rotating code on the venue display.
//! 3. **Receipt**: an external scorer vouches for a purchase (optional).
//!
//! The verifiers and the aggregator are pure and storage-free. The
//! [`CheckinLedger`] is the only component with state, and it delegates all
//! atomicity to the injected store.

pub mod aggregator;
pub mod code;
pub mod engine;
pub mod error;
pub mod events;
pub mod geo;
pub mod ledger;
pub mod receipt;
pub mod state;

pub use aggregator::{Aggregate, VerificationAggregator};
pub use code::{CodeCheck, CodeRotationService, DisplayCode};
pub use engine::{
    Caller, CheckinEngine, CodeCheckResult, CommitRequest, CommitResult, EngineDeps,
    LocationCheckResult, ReceiptCheckResult, StatusResult,
};
pub use error::VerificationError;
pub use events::{CheckinEvent, EventBus, EventSink};
pub use geo::{haversine_meters, GeoCheck, GeoVerifier, LocationFix};
pub use ledger::{CheckinLedger, LedgerEffect, LedgerOutcome};
pub use receipt::{ReceiptCheck, ReceiptEvidence, ReceiptScoreAdapter, ReceiptScoreError, ReceiptScorer};
pub use state::{VerificationAttempt, VerificationPhase};
