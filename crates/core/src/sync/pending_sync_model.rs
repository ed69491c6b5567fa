use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::remote::RemoteWrite;

/// Outbox lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingSyncStatus {
    Pending,
    Synced,
    Failed,
}

impl PendingSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingSyncStatus::Pending => "pending",
            PendingSyncStatus::Synced => "synced",
            PendingSyncStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PendingSyncStatus::Pending),
            "synced" => Some(PendingSyncStatus::Synced),
            "failed" => Some(PendingSyncStatus::Failed),
            _ => None,
        }
    }
}

/// A backend write recorded before it is attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSync {
    pub id: String,
    pub action: String,
    pub payload: Value,
    pub status: PendingSyncStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PendingSync {
    pub fn new(write: RemoteWrite) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            action: write.action,
            payload: write.payload,
            status: PendingSyncStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_write(&self) -> RemoteWrite {
        RemoteWrite::new(&self.action, self.payload.clone())
    }
}

/// Result of one best-effort write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    /// Nothing was sent: the change only exists on this device (signed out,
    /// or the backend has no action for it).
    LocalOnly,
    /// The backend did not accept the write. The local change is kept and
    /// the record stays in the outbox as failed.
    Failed { message: String },
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced)
    }
}

/// Counts from a replay of failed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetrySummary {
    pub synced: usize,
    pub failed: usize,
}
