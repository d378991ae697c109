//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::checkin::LmdbCheckinStore;
use crate::migration::Migrator;
use crate::venue::LmdbVenueStore;
use crate::LmdbError;

pub(crate) const VENUES_DB: &str = "venues";
pub(crate) const CHECKINS_DB: &str = "checkins";
pub(crate) const META_DB: &str = "meta";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) venues_db: Database<Bytes, Bytes>,
    pub(crate) checkins_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;

        // SAFETY: each environment directory is opened once per process; the
        // daemon owns its data dir and tests use fresh temp dirs.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let venues_db = env.create_database(&mut wtxn, Some(VENUES_DB))?;
        let checkins_db = env.create_database(&mut wtxn, Some(CHECKINS_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let lmdb = Self {
            env: Arc::new(env),
            venues_db,
            checkins_db,
            meta_db,
        };
        Migrator::run(&lmdb)?;
        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(lmdb)
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn venue_store(&self) -> LmdbVenueStore {
        LmdbVenueStore {
            env: Arc::clone(&self.env),
            venues_db: self.venues_db,
        }
    }

    pub fn checkin_store(&self) -> LmdbCheckinStore {
        LmdbCheckinStore {
            env: Arc::clone(&self.env),
            checkins_db: self.checkins_db,
        }
    }
}
