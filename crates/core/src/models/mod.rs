//! Domain models exchanged with the remote data gateway and held in the
//! application state.

mod address;
mod inventory;
mod location;
mod order;
mod quality;
mod social;
mod user;

pub use address::*;
pub use inventory::*;
pub use location::*;
pub use order::*;
pub use quality::*;
pub use social::*;
pub use user::*;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a backend row.
///
/// Sheet rows carry ids as numbers (`1718000000000`) or strings (`"INV-12"`);
/// both are kept as their string form so equality is stable across fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        crate::utils::lenient::string(deserializer).map(RecordId)
    }
}
