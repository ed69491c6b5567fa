//! Core of the food-rescue marketplace client: domain models, the persisted
//! application state, navigation, and the session controller that ties them
//! to the remote data and AI analysis gateways.

pub mod ai;
pub mod config;
pub mod errors;
pub mod models;
pub mod navigation;
pub mod refresh;
pub mod remote;
pub mod session;
pub mod state;
pub mod sync;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{Error, Result};
