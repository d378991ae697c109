//! LMDB storage backend for the presence check-in engine.
//!
//! Implements the storage traits from `presence-store` using the `heed` LMDB
//! bindings. Each logical store maps to one LMDB database within a single
//! environment. LMDB admits one write transaction at a time, which is what
//! makes the check-in "insert if absent, else return existing" step atomic.

pub mod checkin;
pub mod environment;
pub mod error;
pub mod integrity;
pub mod migration;
pub mod venue;

pub use checkin::LmdbCheckinStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_integrity, IntegrityReport};
pub use venue::LmdbVenueStore;
