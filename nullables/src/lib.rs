//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the check-in engine (clock, storage, receipt
//! scorer, event consumers) is abstracted behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod events;
pub mod receipt;
pub mod store;

pub use clock::NullClock;
pub use events::RecordingEventSink;
pub use receipt::NullReceiptScorer;
pub use store::NullStore;
