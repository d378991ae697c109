//! Check-in storage trait.
//!
//! Uniqueness of `(venue, user)` is the store's job: both write operations are
//! single atomic steps, so racing requests can never produce two rows or
//! overwrite a passed one.

use crate::StoreError;
use presence_types::{CheckinRecord, UserId, VenueId};

/// Result of [`CheckinStore::insert_or_get`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No row existed; the given record is now stored.
    Inserted(CheckinRecord),
    /// A row already existed and was left untouched.
    Existing(CheckinRecord),
}

impl InsertOutcome {
    pub fn into_record(self) -> CheckinRecord {
        match self {
            Self::Inserted(r) | Self::Existing(r) => r,
        }
    }
}

/// Result of [`CheckinStore::replace_failed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The expected failed row was replaced.
    Replaced(CheckinRecord),
    /// The stored row no longer matched the expectation; it is returned as is.
    Stale(CheckinRecord),
}

pub trait CheckinStore: Send + Sync {
    /// Look up the check-in for a pair. `Ok(None)` means none exists.
    fn get_checkin(
        &self,
        venue: &VenueId,
        user: &UserId,
    ) -> Result<Option<CheckinRecord>, StoreError>;

    /// Atomically insert `record` unless a row for its pair exists.
    fn insert_or_get(&self, record: &CheckinRecord) -> Result<InsertOutcome, StoreError>;

    /// Atomically replace the stored row with `record` if and only if the
    /// stored row equals `expected` and has not passed. A missing row is
    /// treated like `insert_or_get`.
    fn replace_failed(
        &self,
        expected: &CheckinRecord,
        record: &CheckinRecord,
    ) -> Result<ReplaceOutcome, StoreError>;

    /// All check-ins recorded at a venue.
    fn checkins_for_venue(&self, venue: &VenueId) -> Result<Vec<CheckinRecord>, StoreError>;

    fn checkin_count(&self) -> Result<u64, StoreError>;
}
