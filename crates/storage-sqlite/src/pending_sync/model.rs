//! Database model for outbox records.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;

use foodrescue_core::sync::{PendingSync, PendingSyncStatus};

use crate::errors::StorageError;

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::pending_sync)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PendingSyncDB {
    pub id: String,
    pub action: String,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fixed-width RFC 3339 so text order matches time order.
pub(crate) fn to_db_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_db_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| {
            StorageError::Core(foodrescue_core::Error::storage(format!(
                "Invalid timestamp '{}': {}",
                value, err
            )))
        })
}

impl TryFrom<PendingSync> for PendingSyncDB {
    type Error = StorageError;

    fn try_from(record: PendingSync) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            action: record.action,
            payload: serde_json::to_string(&record.payload)?,
            status: record.status.as_str().to_string(),
            attempts: i32::try_from(record.attempts).unwrap_or(i32::MAX),
            last_error: record.last_error,
            created_at: to_db_timestamp(record.created_at),
            updated_at: to_db_timestamp(record.updated_at),
        })
    }
}

impl TryFrom<PendingSyncDB> for PendingSync {
    type Error = StorageError;

    fn try_from(row: PendingSyncDB) -> Result<Self, Self::Error> {
        let status = PendingSyncStatus::parse(&row.status).ok_or_else(|| {
            StorageError::Core(foodrescue_core::Error::storage(format!(
                "Unknown pending sync status '{}'",
                row.status
            )))
        })?;
        Ok(Self {
            payload: serde_json::from_str(&row.payload)?,
            status,
            attempts: u32::try_from(row.attempts).unwrap_or(0),
            created_at: from_db_timestamp(&row.created_at)?,
            updated_at: from_db_timestamp(&row.updated_at)?,
            id: row.id,
            action: row.action,
            last_error: row.last_error,
        })
    }
}
