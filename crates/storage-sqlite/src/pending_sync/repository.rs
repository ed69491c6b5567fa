use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;

use foodrescue_core::sync::{PendingSync, PendingSyncRepositoryTrait, PendingSyncStatus};
use foodrescue_core::{Error, Result};

use super::model::{to_db_timestamp, PendingSyncDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::pending_sync;

pub struct PendingSyncRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PendingSyncRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    async fn transition(
        &self,
        id: &str,
        status: PendingSyncStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let id = id.to_string();
        let error = error.map(str::to_string);
        self.writer
            .exec(move |conn: &mut SqliteConnection| {
                let now = to_db_timestamp(Utc::now());
                let target = pending_sync::table.find(&id);
                let updated = match error {
                    Some(message) => diesel::update(target)
                        .set((
                            pending_sync::status.eq(status.as_str()),
                            pending_sync::attempts.eq(pending_sync::attempts + 1),
                            pending_sync::last_error.eq(Some(message)),
                            pending_sync::updated_at.eq(now),
                        ))
                        .execute(conn),
                    None => diesel::update(target)
                        .set((
                            pending_sync::status.eq(status.as_str()),
                            pending_sync::updated_at.eq(now),
                        ))
                        .execute(conn),
                }
                .map_err(StorageError::from)?;

                if updated == 0 {
                    return Err(Error::storage(format!("Pending sync {} not found", id)));
                }
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl PendingSyncRepositoryTrait for PendingSyncRepository {
    async fn enqueue(&self, record: PendingSync) -> Result<()> {
        let row = PendingSyncDB::try_from(record)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| {
                diesel::insert_into(pending_sync::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn mark_synced(&self, id: &str) -> Result<()> {
        self.transition(id, PendingSyncStatus::Synced, None).await
    }

    async fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        self.transition(id, PendingSyncStatus::Failed, Some(error))
            .await
    }

    async fn list_by_status(&self, status: PendingSyncStatus) -> Result<Vec<PendingSync>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = pending_sync::table
            .filter(pending_sync::status.eq(status.as_str()))
            .order((pending_sync::created_at.asc(), pending_sync::id.asc()))
            .load::<PendingSyncDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter()
            .map(|row| PendingSync::try_from(row).map_err(Error::from))
            .collect()
    }

    async fn purge_synced(&self) -> Result<usize> {
        self.writer
            .exec(|conn: &mut SqliteConnection| {
                let removed = diesel::delete(
                    pending_sync::table
                        .filter(pending_sync::status.eq(PendingSyncStatus::Synced.as_str())),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(removed)
            })
            .await
    }

    async fn clear(&self) -> Result<()> {
        self.writer
            .exec(|conn: &mut SqliteConnection| {
                diesel::delete(pending_sync::table)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
