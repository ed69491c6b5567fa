//! Screen routing: back-stack navigation and the role-dependent layout shell.

mod mode;
mod navigator;
mod screen;

pub use mode::*;
pub use navigator::*;
pub use screen::*;
