use std::sync::Arc;

use serde_json::Value;

use super::{DataGatewayTrait, Envelope, RemoteWrite};
use crate::errors::{Error, Result};
use crate::models::{
    Address, HistoryLookup, InventoryItem, NewInventoryItem, NewOrder, Notification, Order,
    OrderReceipt, RecordId, RegisteredUser, Registration, Report, Review, User,
};
use crate::utils::credentials::to_legacy_wire_form;

/// Typed calls over a [`DataGatewayTrait`].
///
/// List fetches return `None` when the backend did not answer with a
/// successful list, so callers can keep their cached value.
#[derive(Clone)]
pub struct RemoteDataService {
    gateway: Arc<dyn DataGatewayTrait>,
}

impl RemoteDataService {
    pub fn new(gateway: Arc<dyn DataGatewayTrait>) -> Self {
        Self { gateway }
    }

    pub async fn ping(&self) -> bool {
        self.gateway.fetch("ping", &[]).await.is_ready()
    }

    pub async fn check_email_exists(&self, email: &str) -> bool {
        let envelope = self
            .gateway
            .fetch("check_email_exists", &[("email", email.trim().to_lowercase())])
            .await;
        matches!(envelope.field("exists"), Some(Value::Bool(true)))
    }

    /// Authenticates against the backend.
    ///
    /// Empty fields fail validation before any call is made. The password is
    /// sent in its legacy wire form because that is what the backend stores.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(Error::validation("Email dan password wajib diisi"));
        }
        let wire_password =
            to_legacy_wire_form(password).map_err(|err| Error::validation(err.to_string()))?;

        let envelope = self
            .gateway
            .fetch("login", &[("email", email), ("password", wire_password)])
            .await;
        if !envelope.is_ok() {
            return Err(Error::rejected(envelope.message_or("Email atau password salah")));
        }
        let raw = envelope
            .field("user")
            .cloned()
            .ok_or_else(|| Error::rejected(envelope.message_or("Email atau password salah")))?;
        Ok(serde_json::from_value::<User>(raw)?.normalized())
    }

    pub async fn register_user(&self, registration: &Registration) -> Result<RegisteredUser> {
        let write = RemoteWrite::register_user(registration)?;
        let envelope = self.send(&write).await;
        if !envelope.is_ok() {
            return Err(Error::rejected(
                envelope.message_or("Registrasi Gagal. Cek koneksi internet."),
            ));
        }
        Ok(RegisteredUser {
            user_id: envelope
                .field_string("userId")
                .or_else(|| envelope.field_string("id"))
                .unwrap_or_default(),
            message: envelope.message_or("Registrasi berhasil"),
        })
    }

    pub async fn fetch_inventory(&self) -> Option<Vec<InventoryItem>> {
        let rows: Vec<InventoryItem> = self
            .gateway
            .fetch("get_inventory", &[])
            .await
            .rows("inventory")?;
        Some(rows.into_iter().map(InventoryItem::normalized).collect())
    }

    pub async fn fetch_reviews(&self) -> Option<Vec<Review>> {
        self.gateway.fetch("get_reviews", &[]).await.rows("review")
    }

    pub async fn fetch_history(&self, lookup: &HistoryLookup) -> Option<Vec<Order>> {
        let params = [
            ("role", lookup.role.as_wire().to_string()),
            ("identifier", lookup.identifier.clone()),
        ];
        let rows: Vec<Order> = self
            .gateway
            .fetch("get_history", &params)
            .await
            .rows("order")?;
        Some(rows.into_iter().map(Order::normalized).collect())
    }

    pub async fn fetch_notifications(&self, email: &str) -> Option<Vec<Notification>> {
        self.gateway
            .fetch("get_notifications", &[("email", email.to_string())])
            .await
            .rows("notification")
    }

    pub async fn fetch_addresses(&self, email: &str) -> Option<Vec<Address>> {
        self.gateway
            .fetch("get_addresses", &[("email", email.to_string())])
            .await
            .rows("address")
    }

    pub async fn fetch_saved_items(&self, email: &str) -> Option<Vec<RecordId>> {
        self.gateway
            .fetch("get_saved_items", &[("email", email.to_string())])
            .await
            .rows("saved item id")
    }

    pub async fn fetch_reports(&self) -> Option<Vec<Report>> {
        self.gateway.fetch("get_reports", &[]).await.rows("report")
    }

    pub async fn fetch_all_users(&self) -> Option<Vec<User>> {
        let rows: Vec<User> = self.gateway.fetch("get_all_users", &[]).await.rows("user")?;
        Some(rows.into_iter().map(User::normalized).collect())
    }

    /// Places an order and returns the backend id and pickup code.
    pub async fn create_order(&self, order: &NewOrder, user: &User) -> Result<OrderReceipt> {
        let write = RemoteWrite::create_order(order, user)?;
        let envelope = self.send(&write).await;
        if !envelope.is_ok() {
            return Err(Error::rejected(envelope.message_or("Gagal membuat order")));
        }
        Ok(OrderReceipt {
            order_id: envelope
                .field_string("orderId")
                .map(RecordId::from)
                .unwrap_or_default(),
            pickup_code: envelope.field_string("pickupCode").unwrap_or_default(),
        })
    }

    /// Lists a product and returns the backend-assigned id.
    pub async fn add_inventory(
        &self,
        item: &NewInventoryItem,
        partner_name: &str,
    ) -> Result<RecordId> {
        let write = RemoteWrite::add_inventory(item, partner_name)?;
        let envelope = self.send(&write).await;
        if !envelope.is_ok() {
            return Err(Error::rejected(
                envelope.message_or("Gagal menambahkan inventory"),
            ));
        }
        envelope
            .field_string("inventoryId")
            .or_else(|| envelope.field_string("id"))
            .map(RecordId::from)
            .ok_or_else(|| Error::rejected("Backend tidak mengembalikan ID produk"))
    }

    /// Sends a prepared write as-is.
    pub async fn send(&self, write: &RemoteWrite) -> Envelope {
        self.gateway.send(&write.action, &write.payload).await
    }
}
