//! SQLite-backed pending-sync outbox.

mod model;
mod repository;

pub use model::PendingSyncDB;
pub use repository::PendingSyncRepository;
