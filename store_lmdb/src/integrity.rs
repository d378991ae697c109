//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the service begins
//! accepting check-ins.

use crate::checkin::decode_record;
use crate::environment::{LmdbEnvironment, CHECKINS_DB, META_DB, VENUES_DB};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that we expect to exist in a valid environment.
const EXPECTED_DATABASES: &[&str] = &[VENUES_DB, CHECKINS_DB, META_DB];

/// Check LMDB database integrity on startup.
///
/// Opens each expected database and counts its entries, then decodes every
/// check-in row and re-checks its derived fields. Read failures are recorded
/// in the report rather than causing a hard error.
pub fn check_integrity(lmdb: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let env = lmdb.env();
    let mut report = IntegrityReport::default();

    let rtxn = env.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    for entry in lmdb.checkins_db.iter(&rtxn)? {
        match entry {
            Ok((key, val)) => {
                if let Err(e) = decode_record(val) {
                    report.errors.push(format!(
                        "check-in {}: {}",
                        String::from_utf8_lossy(key).replace('\0', "/"),
                        e
                    ));
                }
            }
            Err(e) => report.errors.push(format!("check-in cursor: {}", e)),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_store::CheckinStore;
    use presence_types::{CheckinId, CheckinRecord, Timestamp, UserId, VenueId};

    #[test]
    fn fresh_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 8, 1 << 20).unwrap();
        let report = check_integrity(&env).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked, 3);
        // schema version stamp
        assert_eq!(report.total_entries, 1);
    }

    #[test]
    fn inconsistent_row_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 8, 1 << 20).unwrap();
        let good = CheckinRecord {
            id: CheckinId::new([1; 32]),
            user_id: UserId::new("u1"),
            venue_id: VenueId::new("V1"),
            gps_score: 40,
            qr_score: 40,
            receipt_score: 0,
            total_score: 80,
            passed: true,
            verified_at: Timestamp::new(5),
        };
        env.checkin_store().insert_or_get(&good).unwrap();

        let mut bad = good.clone();
        bad.user_id = UserId::new("u2");
        bad.total_score = 10;
        let mut wtxn = env.env().write_txn().unwrap();
        env.checkins_db
            .put(&mut wtxn, b"V1\0u2", &bincode::serialize(&bad).unwrap())
            .unwrap();
        wtxn.commit().unwrap();

        let report = check_integrity(&env).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("V1/u2"));
    }
}
