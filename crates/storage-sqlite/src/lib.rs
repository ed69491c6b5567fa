//! SQLite persistence for the food-rescue client: the persisted state cache
//! and the pending-sync outbox.

pub mod db;
pub mod errors;
pub mod pending_sync;
pub mod schema;
pub mod state_cache;

use std::path::Path;
use std::sync::Arc;

use foodrescue_core::config::AppConfig;
use foodrescue_core::Result;

pub use errors::StorageError;
pub use pending_sync::PendingSyncRepository;
pub use state_cache::SqliteStateCache;

/// Both stores over one database file and one writer.
pub struct SqliteStorage {
    pub state_cache: Arc<SqliteStateCache>,
    pub pending_sync: Arc<PendingSyncRepository>,
}

impl SqliteStorage {
    /// Opens (creating and migrating if needed) the database in
    /// `app_data_dir`.
    pub fn open(app_data_dir: impl AsRef<Path>) -> Result<Self> {
        let db_path = db::init(app_data_dir)?;
        db::run_migrations(&db_path)?;
        let pool = db::create_pool(&db_path)?;
        let writer = db::spawn_writer(pool.as_ref().clone());

        Ok(Self {
            state_cache: Arc::new(SqliteStateCache::new(pool.clone(), writer.clone())),
            pending_sync: Arc::new(PendingSyncRepository::new(pool, writer)),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::open(&config.data_dir)
    }
}
