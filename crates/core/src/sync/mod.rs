//! Pending-sync outbox: best-effort backend writes made after a local
//! mutation, recorded before they are attempted.

mod dispatcher;
mod pending_sync_model;
mod pending_sync_repository;

pub use dispatcher::*;
pub use pending_sync_model::*;
pub use pending_sync_repository::*;
