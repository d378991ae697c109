//! Venue storage trait.

use crate::StoreError;
use presence_types::{Venue, VenueId};

/// Read access to venues, plus the write path used by onboarding and seeding.
pub trait VenueStore: Send + Sync {
    /// Look up a venue. `Ok(None)` means it does not exist.
    fn get_venue(&self, id: &VenueId) -> Result<Option<Venue>, StoreError>;

    /// Insert or update a venue.
    ///
    /// Fails with [`StoreError::Immutable`] if the venue is already published
    /// (any status other than `pending`) and the update moves its location.
    fn put_venue(&self, venue: &Venue) -> Result<(), StoreError>;

    fn venue_count(&self) -> Result<u64, StoreError>;
}

/// Shared rule for [`VenueStore::put_venue`] implementations.
pub fn check_location_update(existing: &Venue, update: &Venue) -> Result<(), StoreError> {
    let published = existing.status != presence_types::VenueStatus::Pending;
    if published && existing.location != update.location {
        return Err(StoreError::Immutable(format!(
            "location of published venue {}",
            existing.id
        )));
    }
    Ok(())
}
