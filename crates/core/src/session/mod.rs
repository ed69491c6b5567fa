//! Session controller: navigation, role mode and every user-facing state
//! mutation.

mod controller;

pub use controller::*;
