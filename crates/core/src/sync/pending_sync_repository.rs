use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{PendingSync, PendingSyncStatus};
use crate::errors::{Error, Result};

/// Durable storage for outbox records.
#[async_trait]
pub trait PendingSyncRepositoryTrait: Send + Sync {
    async fn enqueue(&self, record: PendingSync) -> Result<()>;

    async fn mark_synced(&self, id: &str) -> Result<()>;

    /// Marks a record failed, bumping its attempt count.
    async fn mark_failed(&self, id: &str, error: &str) -> Result<()>;

    /// Records with `status`, oldest first.
    async fn list_by_status(&self, status: PendingSyncStatus) -> Result<Vec<PendingSync>>;

    /// Drops records already accepted by the backend. Returns how many
    /// were removed.
    async fn purge_synced(&self) -> Result<usize>;

    /// Drops every record.
    async fn clear(&self) -> Result<()>;
}

/// Outbox kept in memory.
#[derive(Debug, Default)]
pub struct MemoryPendingSyncRepository {
    records: Mutex<Vec<PendingSync>>,
}

impl MemoryPendingSyncRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<PendingSync> {
        self.records.lock().await.clone()
    }

    async fn transition(
        &self,
        id: &str,
        status: PendingSyncStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| Error::storage(format!("Pending sync {} not found", id)))?;
        record.status = status;
        record.updated_at = Utc::now();
        if let Some(error) = error {
            record.attempts += 1;
            record.last_error = Some(error.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl PendingSyncRepositoryTrait for MemoryPendingSyncRepository {
    async fn enqueue(&self, record: PendingSync) -> Result<()> {
        self.records.lock().await.push(record);
        Ok(())
    }

    async fn mark_synced(&self, id: &str) -> Result<()> {
        self.transition(id, PendingSyncStatus::Synced, None).await
    }

    async fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        self.transition(id, PendingSyncStatus::Failed, Some(error))
            .await
    }

    async fn list_by_status(&self, status: PendingSyncStatus) -> Result<Vec<PendingSync>> {
        let mut matching: Vec<PendingSync> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn purge_synced(&self) -> Result<usize> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| record.status != PendingSyncStatus::Synced);
        Ok(before - records.len())
    }

    async fn clear(&self) -> Result<()> {
        self.records.lock().await.clear();
        Ok(())
    }
}
