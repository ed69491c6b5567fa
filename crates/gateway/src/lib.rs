//! HTTP client for the action-dispatch remote data backend.

mod client;
mod error;

pub use client::RemoteDataClient;
pub use error::{GatewayError, Result, RetryClass};
