//! SQLite-backed persisted cache for the application state blob.

mod model;
mod repository;

pub use model::AppStateCacheDB;
pub use repository::SqliteStateCache;
