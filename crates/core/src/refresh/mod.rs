//! Reconciles the local state with the remote backend.

mod coordinator;

pub use coordinator::*;
