use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RecordId;
use crate::utils::lenient;

/// A saved delivery/pickup address of the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, alias = "title", deserialize_with = "lenient::string")]
    pub label: String,
    /// Free-form address or a maps link.
    #[serde(default, alias = "desc", deserialize_with = "lenient::string")]
    pub address: String,
    /// `gps` for pinned locations, `manual` otherwise.
    #[serde(default, rename = "type", deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub recipient_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub postal_code: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_primary: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
