use serde::{Deserialize, Serialize};

use super::{RecordId, Role, User};
use crate::utils::lenient;

/// Reservation lifecycle: active, then completed or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Value written to the backend's status column.
    pub fn as_wire(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Active => "Active",
            OrderStatus::Completed => "Selesai",
            OrderStatus::Cancelled => "Dibatalkan",
        }
    }

    /// Reads a status cell. Unknown values are treated as pending.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "aktif" => OrderStatus::Active,
            "selesai" | "completed" | "done" => OrderStatus::Completed,
            "dibatalkan" | "batal" | "cancelled" | "canceled" => OrderStatus::Cancelled,
            _ => OrderStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// A recipient's claim against an inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub user_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub user_email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub partner: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub partner_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub item: String,
    #[serde(default)]
    pub item_id: RecordId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub quantity: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub pickup_code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub total_price: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub delivery_address: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub payment_method: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub timestamp: String,
}

impl Order {
    pub fn lifecycle(&self) -> OrderStatus {
        OrderStatus::from_wire(&self.status)
    }

    pub(crate) fn normalized(mut self) -> Self {
        if self.timestamp.is_empty() {
            self.timestamp = chrono::Utc::now().to_rfc3339();
        }
        self
    }
}

/// A reservation about to be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub partner: String,
    pub partner_id: String,
    pub item: String,
    pub item_id: RecordId,
    pub quantity: u32,
    pub unit: String,
    pub total_price: String,
    pub delivery_address: String,
    pub payment_method: String,
}

/// Backend-assigned identifiers for a created order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub order_id: RecordId,
    pub pickup_code: String,
}

/// Key used by the backend's `get_history` index.
///
/// The backend indexes recipient orders by email and partner orders by the
/// partner's display name. Both branches live here so the asymmetry is not
/// repeated at call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLookup {
    pub role: Role,
    pub identifier: String,
}

impl HistoryLookup {
    pub fn for_user(user: &User) -> Self {
        let identifier = match user.role {
            Role::Recipient => user.email.clone(),
            Role::Partner | Role::Admin => user.name.clone(),
        };
        Self {
            role: user.role,
            identifier,
        }
    }
}
