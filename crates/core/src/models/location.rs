use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Address, RecordId};

/// Name given to a place the lookup could not resolve.
pub const UNRESOLVED_PLACE_NAME: &str = "Titik Lokasi";
pub const PINNED_ADDRESS_KIND: &str = "gps";

/// A point on the map, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A place found by the location lookup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationInfo {
    pub place_name: String,
    /// Human-readable address.
    pub address: String,
    pub map_url: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub rt: String,
    pub rw: String,
}

impl LocationInfo {
    /// Bare coordinates, used when the lookup resolves nothing.
    pub fn unresolved(at: Coordinates) -> Self {
        Self {
            place_name: UNRESOLVED_PLACE_NAME.to_string(),
            address: format!("Koordinat: {:.6}, {:.6}", at.latitude, at.longitude),
            ..Default::default()
        }
    }

    /// The place as a pinned address row. The maps link, when known, is
    /// what gets stored as the address text.
    pub fn to_address(&self, recipient_name: &str, phone: &str) -> Address {
        let mut extra = Map::new();
        for (key, value) in [("province", &self.province), ("rt", &self.rt), ("rw", &self.rw)] {
            if !value.trim().is_empty() {
                extra.insert(key.to_string(), Value::from(value.trim()));
            }
        }
        let address = self
            .map_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(&self.address);

        Address {
            id: RecordId::default(),
            label: self.place_name.trim().to_string(),
            address: address.trim().to_string(),
            kind: PINNED_ADDRESS_KIND.to_string(),
            recipient_name: recipient_name.to_string(),
            phone: phone.to_string(),
            city: self.city.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            is_primary: false,
            extra,
        }
    }
}
