//! Contract of the remote data backend and a typed service over it.

mod envelope;
mod gateway;
mod requests;
mod service;

pub use envelope::*;
pub use gateway::*;
pub use requests::*;
pub use service::*;
