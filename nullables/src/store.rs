//! Nullable store: thread-safe in-memory storage for testing.

use presence_store::checkin::{CheckinStore, InsertOutcome, ReplaceOutcome};
use presence_store::venue::{check_location_update, VenueStore};
use presence_store::StoreError;
use presence_types::{CheckinRecord, UserId, Venue, VenueId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// An in-memory venue + check-in store for testing.
///
/// Each write holds the check-in map lock for the whole read-check-write, so
/// it has the same atomicity as the LMDB backend. `set_unavailable(true)`
/// makes every call fail with a backend error.
pub struct NullStore {
    venues: Mutex<HashMap<VenueId, Venue>>,
    checkins: Mutex<HashMap<(VenueId, UserId), CheckinRecord>>,
    unavailable: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            venues: Mutex::new(HashMap::new()),
            checkins: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Store pre-populated with venues.
    pub fn with_venues(venues: impl IntoIterator<Item = Venue>) -> Self {
        let store = Self::new();
        {
            let mut map = store.venues.lock().unwrap();
            for venue in venues {
                map.insert(venue.id.clone(), venue);
            }
        }
        store
    }

    /// Simulate a storage outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null store is unavailable".into()));
        }
        Ok(())
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueStore for NullStore {
    fn get_venue(&self, id: &VenueId) -> Result<Option<Venue>, StoreError> {
        self.check_available()?;
        Ok(self.venues.lock().unwrap().get(id).cloned())
    }

    fn put_venue(&self, venue: &Venue) -> Result<(), StoreError> {
        self.check_available()?;
        venue
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        let mut map = self.venues.lock().unwrap();
        if let Some(existing) = map.get(&venue.id) {
            check_location_update(existing, venue)?;
        }
        map.insert(venue.id.clone(), venue.clone());
        Ok(())
    }

    fn venue_count(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self.venues.lock().unwrap().len() as u64)
    }
}

impl CheckinStore for NullStore {
    fn get_checkin(
        &self,
        venue: &VenueId,
        user: &UserId,
    ) -> Result<Option<CheckinRecord>, StoreError> {
        self.check_available()?;
        Ok(self
            .checkins
            .lock()
            .unwrap()
            .get(&(venue.clone(), user.clone()))
            .cloned())
    }

    fn insert_or_get(&self, record: &CheckinRecord) -> Result<InsertOutcome, StoreError> {
        self.check_available()?;
        let mut map = self.checkins.lock().unwrap();
        let key = (record.venue_id.clone(), record.user_id.clone());
        if let Some(existing) = map.get(&key) {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        map.insert(key, record.clone());
        Ok(InsertOutcome::Inserted(record.clone()))
    }

    fn replace_failed(
        &self,
        expected: &CheckinRecord,
        record: &CheckinRecord,
    ) -> Result<ReplaceOutcome, StoreError> {
        self.check_available()?;
        let mut map = self.checkins.lock().unwrap();
        let key = (record.venue_id.clone(), record.user_id.clone());
        if let Some(current) = map.get(&key) {
            if current.passed || current != expected {
                return Ok(ReplaceOutcome::Stale(current.clone()));
            }
        }
        map.insert(key, record.clone());
        Ok(ReplaceOutcome::Replaced(record.clone()))
    }

    fn checkins_for_venue(&self, venue: &VenueId) -> Result<Vec<CheckinRecord>, StoreError> {
        self.check_available()?;
        Ok(self
            .checkins
            .lock()
            .unwrap()
            .values()
            .filter(|r| &r.venue_id == venue)
            .cloned()
            .collect())
    }

    fn checkin_count(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self.checkins.lock().unwrap().len() as u64)
    }
}
