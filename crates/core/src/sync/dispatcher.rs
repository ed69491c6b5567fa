use std::sync::Arc;

use super::{
    PendingSync, PendingSyncRepositoryTrait, PendingSyncStatus, RetrySummary, SyncOutcome,
};
use crate::errors::Result;
use crate::remote::{RemoteDataService, RemoteWrite, CONNECTION_FAILED_MESSAGE};

/// Recorded on writes whose attempt never finished (the process stopped
/// between enqueue and the backend reply).
pub const INTERRUPTED_SYNC_MESSAGE: &str = "Pengiriman terputus sebelum selesai";

/// Records each write in the outbox, attempts it, and marks the outcome.
#[derive(Clone)]
pub struct SyncDispatcher {
    remote: RemoteDataService,
    outbox: Arc<dyn PendingSyncRepositoryTrait>,
}

impl SyncDispatcher {
    pub fn new(remote: RemoteDataService, outbox: Arc<dyn PendingSyncRepositoryTrait>) -> Self {
        Self { remote, outbox }
    }

    /// Enqueues `write`, sends it once and records the result.
    ///
    /// An outbox failure is logged and does not stop the remote attempt.
    pub async fn dispatch(&self, write: RemoteWrite) -> SyncOutcome {
        let record = PendingSync::new(write);
        let recorded = match self.outbox.enqueue(record.clone()).await {
            Ok(()) => true,
            Err(err) => {
                log::error!(
                    "[Sync] Failed to record pending {} write: {}",
                    record.action,
                    err
                );
                false
            }
        };
        self.attempt(&record, recorded).await
    }

    /// Replays failed records in creation order.
    pub async fn retry_failed(&self) -> Result<RetrySummary> {
        let failed = self.outbox.list_by_status(PendingSyncStatus::Failed).await?;
        let mut summary = RetrySummary::default();
        for record in failed {
            match self.attempt(&record, true).await {
                SyncOutcome::Synced => summary.synced += 1,
                SyncOutcome::Failed { .. } | SyncOutcome::LocalOnly => summary.failed += 1,
            }
        }
        if summary.synced + summary.failed > 0 {
            log::info!(
                "[Sync] Replayed failed writes: {} synced, {} still failing",
                summary.synced,
                summary.failed
            );
        }
        Ok(summary)
    }

    /// Marks records still `Pending` from an earlier run as failed so they
    /// show up in [`failed`](Self::failed) and are replayed by
    /// [`retry_failed`](Self::retry_failed). Only safe before any new write
    /// is dispatched.
    pub async fn recover_interrupted(&self) -> Result<usize> {
        let stranded = self.outbox.list_by_status(PendingSyncStatus::Pending).await?;
        for record in &stranded {
            self.outbox
                .mark_failed(&record.id, INTERRUPTED_SYNC_MESSAGE)
                .await?;
        }
        if !stranded.is_empty() {
            log::warn!(
                "[Sync] {} write(s) were interrupted before the backend answered",
                stranded.len()
            );
        }
        Ok(stranded.len())
    }

    pub async fn failed(&self) -> Result<Vec<PendingSync>> {
        self.outbox.list_by_status(PendingSyncStatus::Failed).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.outbox.clear().await
    }

    async fn attempt(&self, record: &PendingSync, recorded: bool) -> SyncOutcome {
        let envelope = self.remote.send(&record.to_write()).await;
        if envelope.is_ok() {
            log::debug!("[Sync] {} synced", record.action);
            if recorded {
                let settled = match self.outbox.mark_synced(&record.id).await {
                    Ok(()) => self.outbox.purge_synced().await.map(|_| ()),
                    Err(err) => Err(err),
                };
                if let Err(err) = settled {
                    log::warn!("[Sync] Could not settle {}: {}", record.id, err);
                }
            }
            return SyncOutcome::Synced;
        }

        let message = envelope.message_or(CONNECTION_FAILED_MESSAGE);
        log::warn!("[Sync] {} failed: {}", record.action, message);
        if recorded {
            if let Err(err) = self.outbox.mark_failed(&record.id, &message).await {
                log::warn!("[Sync] Could not mark {} failed: {}", record.id, err);
            }
        }
        SyncOutcome::Failed { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{DataGatewayTrait, Envelope};
    use crate::sync::MemoryPendingSyncRepository;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Switchable {
        online: AtomicBool,
    }

    #[async_trait]
    impl DataGatewayTrait for Switchable {
        async fn fetch(&self, _action: &str, _params: &[(&str, String)]) -> Envelope {
            Envelope::failure("unused")
        }

        async fn send(&self, _action: &str, _payload: &Value) -> Envelope {
            if self.online.load(Ordering::SeqCst) {
                Envelope::ok()
            } else {
                Envelope::failure("Server sibuk")
            }
        }
    }

    fn setup(online: bool) -> (SyncDispatcher, Arc<Switchable>, Arc<MemoryPendingSyncRepository>) {
        let gateway = Arc::new(Switchable {
            online: AtomicBool::new(online),
        });
        let outbox = Arc::new(MemoryPendingSyncRepository::new());
        let dispatcher = SyncDispatcher::new(RemoteDataService::new(gateway.clone()), outbox.clone());
        (dispatcher, gateway, outbox)
    }

    fn write() -> RemoteWrite {
        RemoteWrite::new("delete_inventory", json!({"id": "1"}))
    }

    #[tokio::test]
    async fn successful_write_leaves_nothing_behind() {
        let (dispatcher, _, outbox) = setup(true);
        assert_eq!(dispatcher.dispatch(write()).await, SyncOutcome::Synced);
        assert!(outbox.all().await.is_empty());
    }

    #[tokio::test]
    async fn failed_write_surfaces_message_and_stays_in_outbox() {
        let (dispatcher, _, outbox) = setup(false);
        let outcome = dispatcher.dispatch(write()).await;
        assert_eq!(
            outcome,
            SyncOutcome::Failed {
                message: "Server sibuk".to_string()
            }
        );
        let failed = dispatcher.failed().await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].attempts, 1);
        assert_eq!(failed[0].last_error.as_deref(), Some("Server sibuk"));
        assert_eq!(outbox.all().await.len(), 1);
    }

    #[tokio::test]
    async fn retry_replays_failed_records() {
        let (dispatcher, gateway, outbox) = setup(false);
        dispatcher.dispatch(write()).await;
        dispatcher.dispatch(write()).await;

        let summary = dispatcher.retry_failed().await.unwrap();
        assert_eq!(summary, RetrySummary { synced: 0, failed: 2 });
        assert_eq!(dispatcher.failed().await.unwrap()[0].attempts, 2);

        gateway.online.store(true, Ordering::SeqCst);
        let summary = dispatcher.retry_failed().await.unwrap();
        assert_eq!(summary, RetrySummary { synced: 2, failed: 0 });
        assert!(dispatcher.failed().await.unwrap().is_empty());
        assert!(outbox.all().await.is_empty());
    }

    #[tokio::test]
    async fn stranded_pending_records_become_retryable() {
        let (dispatcher, gateway, outbox) = setup(false);
        outbox.enqueue(PendingSync::new(write())).await.unwrap();

        assert!(dispatcher.failed().await.unwrap().is_empty());
        assert_eq!(dispatcher.recover_interrupted().await.unwrap(), 1);
        assert_eq!(dispatcher.recover_interrupted().await.unwrap(), 0);

        let failed = dispatcher.failed().await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].last_error.as_deref(), Some(INTERRUPTED_SYNC_MESSAGE));

        gateway.online.store(true, Ordering::SeqCst);
        let summary = dispatcher.retry_failed().await.unwrap();
        assert_eq!(summary, RetrySummary { synced: 1, failed: 0 });
        assert!(outbox.all().await.is_empty());
    }
}
