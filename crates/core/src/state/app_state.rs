use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::models::{
    Address, InventoryItem, Notification, Order, ProductDraft, QualityCheckRecord, RecordId,
    Report, Review, User,
};
use crate::navigation::AppMode;
use crate::utils::lenient;

/// Storage key of the persisted state blob.
pub const STATE_CACHE_KEY: &str = "food_ai_state";

/// Version written into every persisted blob.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_LOCATION_LABEL: &str = "Jakarta Pusat";

/// One-shot values passed from one screen to the next.
///
/// Each slot is consumed with `take`, which clears it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Handoff {
    /// Item picked on a detail screen, read by the reservation form.
    pub reservation_item: Option<InventoryItem>,
    /// AI-prefilled product, read by the upload form.
    pub product_draft: Option<ProductDraft>,
}

impl Handoff {
    pub fn is_empty(&self) -> bool {
        self.reservation_item.is_none() && self.product_draft.is_none()
    }
}

/// The whole client-side application state.
///
/// Aliases accept the field names of blobs written before the schema was
/// versioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    #[serde(alias = "user")]
    pub current_user: Option<User>,
    #[serde(alias = "savedItems")]
    pub saved_item_ids: Vec<RecordId>,
    #[serde(alias = "qualityHistory", deserialize_with = "lenient::list")]
    pub quality_check_history: Vec<QualityCheckRecord>,
    #[serde(deserialize_with = "lenient::list")]
    pub reviews: Vec<Review>,
    #[serde(alias = "partnerInventory", deserialize_with = "lenient::list")]
    pub inventory: Vec<InventoryItem>,
    #[serde(alias = "currentLocationName")]
    pub current_location_label: String,
    #[serde(deserialize_with = "lenient::list")]
    pub addresses: Vec<Address>,
    #[serde(alias = "historyItems", deserialize_with = "lenient::list")]
    pub order_history: Vec<Order>,
    #[serde(deserialize_with = "lenient::list")]
    pub reports: Vec<Report>,
    #[serde(deserialize_with = "lenient::list")]
    pub all_users: Vec<User>,
    #[serde(deserialize_with = "lenient::list")]
    pub notifications: Vec<Notification>,
    pub handoff: Handoff,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            current_user: None,
            saved_item_ids: Vec::new(),
            quality_check_history: Vec::new(),
            reviews: Vec::new(),
            inventory: Vec::new(),
            current_location_label: DEFAULT_LOCATION_LABEL.to_string(),
            addresses: Vec::new(),
            order_history: Vec::new(),
            reports: Vec::new(),
            all_users: Vec::new(),
            notifications: Vec::new(),
            handoff: Handoff::default(),
        }
    }
}

impl AppState {
    pub fn mode(&self) -> AppMode {
        AppMode::from_role(self.current_user.as_ref().map(|user| user.role))
    }

    pub fn is_saved(&self, id: &RecordId) -> bool {
        self.saved_item_ids.contains(id)
    }

    /// Adds or removes `id` from the saved set. Returns whether it is saved
    /// afterwards.
    pub fn toggle_saved(&mut self, id: &RecordId) -> bool {
        if let Some(pos) = self.saved_item_ids.iter().position(|saved| saved == id) {
            self.saved_item_ids.remove(pos);
            false
        } else {
            self.saved_item_ids.push(id.clone());
            true
        }
    }

    /// Saved entries that still exist in the inventory.
    pub fn saved_items(&self) -> Vec<&InventoryItem> {
        self.saved_item_ids
            .iter()
            .filter_map(|id| self.inventory.iter().find(|item| &item.id == id))
            .collect()
    }

    pub fn inventory_item(&self, id: &RecordId) -> Option<&InventoryItem> {
        self.inventory.iter().find(|item| &item.id == id)
    }

    /// Installs `user` as the signed-in actor.
    ///
    /// When the identity (id plus role) changes, every role-scoped slot and
    /// the handoff are reset to the signed-out baseline first; the public
    /// inventory, reviews and location label are kept. Returns whether the
    /// identity changed.
    pub fn sign_in(&mut self, user: User) -> bool {
        let changed = self.current_user.as_ref().map(User::identity) != Some(user.identity());
        if changed {
            let public = AppState {
                inventory: std::mem::take(&mut self.inventory),
                reviews: std::mem::take(&mut self.reviews),
                current_location_label: std::mem::take(&mut self.current_location_label),
                ..AppState::default()
            };
            *self = public;
        }
        self.current_user = Some(user);
        changed
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CachedStateRef<'a> {
    schema_version: u32,
    state: &'a AppState,
}

/// Serializes the full state into the versioned cache blob.
pub fn encode_state(state: &AppState) -> Result<String> {
    Ok(serde_json::to_string(&CachedStateRef {
        schema_version: CACHE_SCHEMA_VERSION,
        state,
    })?)
}

/// Reads a cache blob written by this or an earlier client.
///
/// A blob without `schemaVersion` is the legacy bare state object. A newer
/// version than [`CACHE_SCHEMA_VERSION`] is rejected.
pub fn decode_state(blob: &str) -> Result<AppState> {
    let mut value: Value = serde_json::from_str(blob)?;
    let Some(object) = value.as_object_mut() else {
        return Err(Error::storage("cached state is not a JSON object"));
    };

    match object.get("schemaVersion").and_then(Value::as_u64) {
        None => Ok(serde_json::from_value(value)?),
        Some(version) if version > u64::from(CACHE_SCHEMA_VERSION) => Err(Error::storage(format!(
            "cached state schema {} is newer than supported {}",
            version, CACHE_SCHEMA_VERSION
        ))),
        Some(_) => {
            let state = object.remove("state").unwrap_or(Value::Null);
            if state.is_null() {
                return Ok(AppState::default());
            }
            Ok(serde_json::from_value(state)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn item(id: &str) -> InventoryItem {
        InventoryItem {
            id: RecordId::from(id),
            name: format!("Item {}", id),
            ..Default::default()
        }
    }

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            name: format!("User {}", id),
            email: format!("{}@mail.com", id),
            role,
            ..Default::default()
        }
    }

    #[test]
    fn default_state_matches_signed_out_baseline() {
        let state = AppState::default();
        assert!(state.current_user.is_none());
        assert!(state.inventory.is_empty());
        assert_eq!(state.current_location_label, "Jakarta Pusat");
        assert!(state.handoff.is_empty());
        assert_eq!(state.mode(), AppMode::Guest);
    }

    #[test]
    fn toggle_saved_adds_and_removes() {
        let mut state = AppState {
            saved_item_ids: vec![RecordId::from("1"), RecordId::from("2")],
            ..Default::default()
        };
        assert!(!state.toggle_saved(&RecordId::from("2")));
        assert_eq!(state.saved_item_ids, vec![RecordId::from("1")]);
        assert!(state.toggle_saved(&RecordId::from("3")));
        assert_eq!(
            state.saved_item_ids,
            vec![RecordId::from("1"), RecordId::from("3")]
        );
    }

    #[test]
    fn saved_items_skip_dangling_ids() {
        let state = AppState {
            inventory: vec![item("1"), item("2")],
            saved_item_ids: vec![RecordId::from("2"), RecordId::from("9")],
            ..Default::default()
        };
        let saved = state.saved_items();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, RecordId::from("2"));
        // Not pruned eagerly.
        assert_eq!(state.saved_item_ids.len(), 2);
    }

    #[test]
    fn switching_account_resets_role_scoped_slots() {
        let mut state = AppState::default();
        state.sign_in(user("1", Role::Admin));
        state.inventory = vec![item("1")];
        state.reports = vec![Report::default()];
        state.saved_item_ids = vec![RecordId::from("1")];
        state.handoff.reservation_item = Some(item("1"));

        assert!(state.sign_in(user("2", Role::Recipient)));
        assert!(state.reports.is_empty());
        assert!(state.saved_item_ids.is_empty());
        assert!(state.handoff.is_empty());
        assert_eq!(state.inventory.len(), 1);
        assert_eq!(state.mode(), AppMode::Recipient);
    }

    #[test]
    fn same_identity_keeps_slots() {
        let mut state = AppState::default();
        state.sign_in(user("1", Role::Recipient));
        state.addresses = vec![Address::default()];

        let mut renamed = user("1", Role::Recipient);
        renamed.name = "Renamed".to_string();
        assert!(!state.sign_in(renamed));
        assert_eq!(state.addresses.len(), 1);
        assert_eq!(state.current_user.unwrap().name, "Renamed");
    }

    #[test]
    fn versioned_blob_round_trips() {
        let mut state = AppState::default();
        state.sign_in(user("7", Role::Partner));
        state.inventory = vec![item("1")];
        state.handoff.product_draft = Some(ProductDraft {
            name: "Nasi Goreng".to_string(),
            ..Default::default()
        });

        let blob = encode_state(&state).unwrap();
        assert!(blob.contains("\"schemaVersion\":1"));
        assert_eq!(decode_state(&blob).unwrap(), state);
    }

    #[test]
    fn legacy_blob_is_read_through_aliases() {
        let blob = r#"{
            "user": {"id": 5, "name": "Warung Bu Sri", "email": "sri@mail.com", "role": "PARTNER"},
            "savedItems": [1, "2"],
            "partnerInventory": [{"id": 1, "name": "Nasi", "amount": "4 Porsi"}],
            "historyItems": [{"id": "ORD-1", "status": "Selesai"}],
            "currentLocationName": "Bandung",
            "qualityHistory": [{"unexpected": true}]
        }"#;
        let state = decode_state(blob).unwrap();
        assert_eq!(state.current_user.as_ref().unwrap().role, Role::Partner);
        assert_eq!(state.saved_item_ids.len(), 2);
        assert_eq!(state.inventory[0].name, "Nasi");
        assert_eq!(state.order_history.len(), 1);
        assert_eq!(state.current_location_label, "Bandung");
        assert!(state.quality_check_history.is_empty());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let blob = r#"{"schemaVersion": 99, "state": {}}"#;
        assert!(decode_state(blob).is_err());
        assert!(decode_state("not json").is_err());
        assert!(decode_state("[]").is_err());
    }
}
