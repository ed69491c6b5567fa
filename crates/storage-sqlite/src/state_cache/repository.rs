use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;

use foodrescue_core::state::{StateCacheTrait, STATE_CACHE_KEY};
use foodrescue_core::Result;

use super::model::AppStateCacheDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::app_state_cache;

/// Keeps the state blob in a single row keyed by [`STATE_CACHE_KEY`].
pub struct SqliteStateCache {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteStateCache {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl StateCacheTrait for SqliteStateCache {
    async fn load(&self) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let row = app_state_cache::table
            .find(STATE_CACHE_KEY)
            .first::<AppStateCacheDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(|r| r.blob))
    }

    async fn save(&self, blob: String) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| {
                let now = Utc::now().to_rfc3339();
                let row = AppStateCacheDB {
                    cache_key: STATE_CACHE_KEY.to_string(),
                    blob: blob.clone(),
                    updated_at: now.clone(),
                };
                diesel::insert_into(app_state_cache::table)
                    .values(&row)
                    .on_conflict(app_state_cache::cache_key)
                    .do_update()
                    .set((
                        app_state_cache::blob.eq(blob),
                        app_state_cache::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn remove(&self) -> Result<()> {
        self.writer
            .exec(|conn: &mut SqliteConnection| {
                diesel::delete(app_state_cache::table.find(STATE_CACHE_KEY))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
