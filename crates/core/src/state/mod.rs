//! Application state, its persisted cache, and the single-writer store.

mod app_state;
mod cache;
mod store;

pub use app_state::*;
pub use cache::*;
pub use store::*;
