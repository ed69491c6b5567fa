//! Small pure helpers shared across the core crate.

pub mod contact;
pub mod credentials;
pub mod lenient;
