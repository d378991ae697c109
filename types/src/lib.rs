//! Fundamental types for the presence check-in engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! identifiers, coordinates, venues, check-in records, scoring parameters, and time.

pub mod checkin;
pub mod error;
pub mod geo;
pub mod id;
pub mod params;
pub mod time;
pub mod venue;

pub use checkin::{CheckinId, CheckinRecord, ComponentScores};
pub use error::TypesError;
pub use geo::Coordinate;
pub use id::{UserId, VenueId};
pub use params::{
    VerificationParams, GPS_WEIGHT, MAX_TOTAL_SCORE, PASS_THRESHOLD, QR_WEIGHT, RECEIPT_WEIGHT,
};
pub use time::{Clock, SystemClock, Timestamp};
pub use venue::{Venue, VenueSecret, VenueStatus};
