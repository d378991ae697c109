//! LMDB implementation of CheckinStore.
//!
//! Rows are keyed by `venue_id ++ 0x00 ++ user_id`; ids never contain control
//! characters, so the key is unambiguous and all check-ins of a venue form one
//! contiguous prefix range. Each write is a read-check-write inside a single
//! write transaction, and LMDB runs write transactions one at a time.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use presence_store::{CheckinStore, InsertOutcome, ReplaceOutcome, StoreError};
use presence_types::{CheckinRecord, UserId, VenueId};

use crate::LmdbError;

pub struct LmdbCheckinStore {
    pub(crate) env: Arc<Env>,
    pub(crate) checkins_db: Database<Bytes, Bytes>,
}

/// Build composite key `venue_bytes ++ 0x00 ++ user_bytes`.
fn checkin_key(venue: &VenueId, user: &UserId) -> Vec<u8> {
    let v = venue.as_bytes();
    let u = user.as_bytes();
    let mut key = Vec::with_capacity(v.len() + 1 + u.len());
    key.extend_from_slice(v);
    key.push(0);
    key.extend_from_slice(u);
    key
}

fn venue_prefix(venue: &VenueId) -> Vec<u8> {
    let mut prefix = venue.as_bytes().to_vec();
    prefix.push(0);
    prefix
}

pub(crate) fn decode_record(bytes: &[u8]) -> Result<CheckinRecord, StoreError> {
    let record: CheckinRecord = bincode::deserialize(bytes).map_err(LmdbError::from)?;
    record
        .validate()
        .map_err(|e| StoreError::Corruption(e.to_string()))?;
    Ok(record)
}

impl LmdbCheckinStore {
    fn read(&self, txn: &RoTxn, key: &[u8]) -> Result<Option<CheckinRecord>, StoreError> {
        match self.checkins_db.get(txn, key).map_err(LmdbError::from)? {
            Some(bytes) => decode_record(bytes).map(Some),
            None => Ok(None),
        }
    }
}

impl CheckinStore for LmdbCheckinStore {
    fn get_checkin(
        &self,
        venue: &VenueId,
        user: &UserId,
    ) -> Result<Option<CheckinRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.read(&rtxn, &checkin_key(venue, user))
    }

    fn insert_or_get(&self, record: &CheckinRecord) -> Result<InsertOutcome, StoreError> {
        let key = checkin_key(&record.venue_id, &record.user_id);
        let encoded = bincode::serialize(record).map_err(LmdbError::from)?;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if let Some(existing) = self.read(&wtxn, &key)? {
            // Dropping the transaction aborts it.
            return Ok(InsertOutcome::Existing(existing));
        }
        self.checkins_db
            .put(&mut wtxn, &key, &encoded)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(InsertOutcome::Inserted(record.clone()))
    }

    fn replace_failed(
        &self,
        expected: &CheckinRecord,
        record: &CheckinRecord,
    ) -> Result<ReplaceOutcome, StoreError> {
        let key = checkin_key(&record.venue_id, &record.user_id);
        let encoded = bincode::serialize(record).map_err(LmdbError::from)?;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if let Some(current) = self.read(&wtxn, &key)? {
            if current.passed || current != *expected {
                return Ok(ReplaceOutcome::Stale(current));
            }
        }
        self.checkins_db
            .put(&mut wtxn, &key, &encoded)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(ReplaceOutcome::Replaced(record.clone()))
    }

    fn checkins_for_venue(&self, venue: &VenueId) -> Result<Vec<CheckinRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = venue_prefix(venue);
        let iter = self
            .checkins_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            results.push(decode_record(val)?);
        }
        Ok(results)
    }

    fn checkin_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.checkins_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
