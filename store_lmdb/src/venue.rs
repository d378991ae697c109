//! LMDB implementation of VenueStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use presence_store::venue::check_location_update;
use presence_store::{StoreError, VenueStore};
use presence_types::{Venue, VenueId};

use crate::LmdbError;

pub struct LmdbVenueStore {
    pub(crate) env: Arc<Env>,
    pub(crate) venues_db: Database<Bytes, Bytes>,
}

fn decode_venue(bytes: &[u8]) -> Result<Venue, StoreError> {
    let venue: Venue = bincode::deserialize(bytes).map_err(LmdbError::from)?;
    venue
        .validate()
        .map_err(|e| StoreError::Corruption(e.to_string()))?;
    Ok(venue)
}

impl VenueStore for LmdbVenueStore {
    fn get_venue(&self, id: &VenueId) -> Result<Option<Venue>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .venues_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode_venue(bytes).map(Some),
            None => Ok(None),
        }
    }

    fn put_venue(&self, venue: &Venue) -> Result<(), StoreError> {
        venue
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        let encoded = bincode::serialize(venue).map_err(LmdbError::from)?;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing = match self
            .venues_db
            .get(&wtxn, venue.id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Some(decode_venue(bytes)?),
            None => None,
        };
        if let Some(existing) = existing {
            check_location_update(&existing, venue)?;
        }
        self.venues_db
            .put(&mut wtxn, venue.id.as_bytes(), &encoded)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn venue_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.venues_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_types::{Coordinate, VenueSecret, VenueStatus};

    fn venue(id: &str, status: VenueStatus, lat: f64) -> Venue {
        Venue {
            id: VenueId::new(id),
            name: format!("Popup {id}"),
            location: Coordinate::new(lat, 126.978).unwrap(),
            status,
            secret: VenueSecret::new(vec![0x11; 32]).unwrap(),
            max_range_meters: None,
        }
    }

    fn open() -> (tempfile::TempDir, crate::LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = crate::LmdbEnvironment::open(dir.path(), 8, 1 << 20).unwrap();
        (dir, env)
    }

    #[test]
    fn put_and_get_venue() {
        let (_dir, env) = open();
        let store = env.venue_store();
        let v = venue("V1", VenueStatus::Confirmed, 37.5665);

        assert!(store.get_venue(&v.id).unwrap().is_none());
        store.put_venue(&v).unwrap();

        let loaded = store.get_venue(&v.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Popup V1");
        assert_eq!(loaded.status, VenueStatus::Confirmed);
        assert_eq!(loaded.secret, v.secret);
        assert_eq!(store.venue_count().unwrap(), 1);
    }

    #[test]
    fn status_update_keeps_location() {
        let (_dir, env) = open();
        let store = env.venue_store();
        store.put_venue(&venue("V1", VenueStatus::Confirmed, 37.0)).unwrap();
        store.put_venue(&venue("V1", VenueStatus::Completed, 37.0)).unwrap();
        assert_eq!(
            store.get_venue(&VenueId::new("V1")).unwrap().unwrap().status,
            VenueStatus::Completed
        );
    }

    #[test]
    fn published_location_is_immutable() {
        let (_dir, env) = open();
        let store = env.venue_store();
        store.put_venue(&venue("V1", VenueStatus::Funding, 37.0)).unwrap();
        let err = store
            .put_venue(&venue("V1", VenueStatus::Funding, 38.0))
            .unwrap_err();
        assert!(matches!(err, StoreError::Immutable(_)));
    }

    #[test]
    fn invalid_venue_is_rejected_not_stored() {
        let (_dir, env) = open();
        let store = env.venue_store();
        let mut v = venue("V1", VenueStatus::Confirmed, 37.0);
        v.max_range_meters = Some(-5.0);
        assert!(matches!(store.put_venue(&v), Err(StoreError::Invalid(_))));
        assert!(store.get_venue(&v.id).unwrap().is_none());
    }

    #[test]
    fn pending_venue_may_move() {
        let (_dir, env) = open();
        let store = env.venue_store();
        store.put_venue(&venue("V1", VenueStatus::Pending, 37.0)).unwrap();
        store.put_venue(&venue("V1", VenueStatus::Pending, 38.0)).unwrap();
    }
}
