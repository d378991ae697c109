//! Abstract storage traits for the presence check-in engine.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The verification engine depends only on the traits.

pub mod checkin;
pub mod error;
pub mod venue;

pub use checkin::{CheckinStore, InsertOutcome, ReplaceOutcome};
pub use error::StoreError;
pub use venue::VenueStore;
