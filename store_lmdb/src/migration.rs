//! Database schema versioning.
//!
//! Tracks a monotonically increasing schema version in the meta database and
//! runs sequential migration functions to bring an older database up to date.

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - If the stored version is *higher* than what this code supports,
    ///   the database was written by a newer build and we refuse to open it.
    pub fn run(lmdb: &LmdbEnvironment) -> Result<(), LmdbError> {
        let current = Self::stored_version(lmdb)?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Schema(format!(
                "database schema version {} is newer than supported version {}",
                current, CURRENT_SCHEMA_VERSION
            )));
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        Self::set_version(lmdb, CURRENT_SCHEMA_VERSION)?;
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }

    pub fn stored_version(lmdb: &LmdbEnvironment) -> Result<u32, LmdbError> {
        let rtxn = lmdb.env().read_txn()?;
        match lmdb.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            None => Ok(0),
            Some(bytes) => {
                let buf: [u8; 4] = bytes
                    .try_into()
                    .map_err(|_| LmdbError::Schema("invalid schema version bytes".into()))?;
                Ok(u32::from_be_bytes(buf))
            }
        }
    }

    pub(crate) fn set_version(lmdb: &LmdbEnvironment, version: u32) -> Result<(), LmdbError> {
        let mut wtxn = lmdb.env().write_txn()?;
        lmdb.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_be_bytes())?;
        wtxn.commit()?;
        Ok(())
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema: `venues` keyed by venue id, `checkins` keyed by
        // `venue_id ++ 0x00 ++ user_id`, bincode values.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Schema(format!(
            "unknown migration: {} -> {}",
            from, to
        ))),
    }
}
