use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::{Error, Result};
use crate::models::{
    Address, FoodRequest, NewInventoryItem, NewOrder, OrderStatus, QualityAnalysis, RecordId,
    Registration, Report, Review, Role, User, DEFAULT_AMOUNT_UNIT, DEFAULT_ITEM_STATUS,
};
use crate::utils::contact::validate_email;
use crate::utils::credentials::to_legacy_wire_form;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Category sent when a listing has none.
const FALLBACK_LISTING_CATEGORY: &str = "Makanan";

/// A backend write: the `action` name plus its JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWrite {
    pub action: String,
    pub payload: Value,
}

impl RemoteWrite {
    pub fn new(action: &str, payload: Value) -> Self {
        Self {
            action: action.to_string(),
            payload,
        }
    }

    /// Replaces the user's saved-item list on the backend.
    pub fn sync_saved_items(email: &str, item_ids: &[RecordId]) -> Result<Self> {
        require(email, "Email wajib diisi")?;
        Ok(Self::new(
            "sync_saved_items",
            json!({ "email": email, "itemIds": item_ids }),
        ))
    }

    pub fn update_order_status(
        order_id: &RecordId,
        status: OrderStatus,
        user_email: Option<&str>,
    ) -> Result<Self> {
        require(order_id.as_str(), "Order tidak valid")?;
        let mut payload = json!({ "orderId": order_id, "status": status.as_wire() });
        if let Some(email) = user_email.filter(|e| !e.trim().is_empty()) {
            payload["userEmail"] = Value::from(email);
        }
        Ok(Self::new("update_order_status", payload))
    }

    pub fn submit_review(review: &Review) -> Result<Self> {
        require(&review.user_email, "Email pengulas wajib diisi")?;
        if !(1..=5).contains(&review.rating) {
            return Err(Error::validation("Rating harus antara 1 dan 5"));
        }
        Ok(Self::new("submit_review", serde_json::to_value(review)?))
    }

    pub fn submit_report(report: &Report) -> Result<Self> {
        require(&report.reporter_email, "Email pelapor wajib diisi")?;
        require(&report.description, "Deskripsi laporan wajib diisi")?;
        let mut payload = serde_json::to_value(report)?;
        if let Some(object) = payload.as_object_mut() {
            // Older sheets key the reporter by `userId`.
            object.insert("userId".to_string(), Value::from(report.reporter_email.clone()));
            default_text(object, "reportType", "OTHER");
            default_text(object, "title", "Laporan");
        }
        Ok(Self::new("submit_report", payload))
    }

    pub fn create_request(user_email: &str, request: &FoodRequest) -> Result<Self> {
        require(&request.food_name, "Nama makanan wajib diisi")?;
        let user_id = if user_email.trim().is_empty() {
            "guest"
        } else {
            user_email
        };
        let budget = if request.budget.trim().is_empty() {
            "0"
        } else {
            request.budget.trim()
        };
        Ok(Self::new(
            "create_request",
            json!({
                "userId": user_id,
                "foodName": request.food_name.trim(),
                "budget": budget,
                "date": chrono::Utc::now().to_rfc3339(),
            }),
        ))
    }

    pub fn save_address(address: &Address, user_email: &str) -> Result<Self> {
        require(user_email, "Email wajib diisi")?;
        require(&address.address, "Alamat wajib diisi")?;
        let mut payload = serde_json::to_value(address)?;
        if let Some(object) = payload.as_object_mut() {
            object.insert("userEmail".to_string(), Value::from(user_email));
        }
        Ok(Self::new("save_address", payload))
    }

    /// Profile columns are written under every header the sheets use.
    pub fn update_profile(user: &User) -> Result<Self> {
        require(&user.email, "Email wajib diisi")?;
        let now = chrono::Utc::now().to_rfc3339();
        Ok(Self::new(
            "update_profile",
            json!({
                "email": user.email,
                "name": user.name,
                "phone": user.phone,
                "avatar": user.avatar,
                "address": user.address,
                "ownerName": user.owner_name,
                "Nama Pemilik": user.owner_name,
                "nama_pemilik": user.owner_name,
                "Alamat": user.address,
                "alamat": user.address,
                "Link Maps": user.address,
                "Nama Toko": user.name,
                "updatedAt": now,
                "Updated At": now,
            }),
        ))
    }

    pub fn delete_inventory(id: &RecordId) -> Result<Self> {
        require(id.as_str(), "Produk tidak valid")?;
        Ok(Self::new("delete_inventory", json!({ "id": id })))
    }

    pub fn log_quality_check(analysis: &QualityAnalysis, partner_name: &str) -> Self {
        let partner_name = if partner_name.trim().is_empty() {
            "User"
        } else {
            partner_name
        };
        Self::new(
            "log_quality_check",
            json!({
                "partnerName": partner_name,
                "isSafe": analysis.is_safe,
                "qualityPercentage": analysis.quality_percentage,
                "reasoning": analysis.reasoning,
            }),
        )
    }

    /// Sign-up payload. The password is sent in its legacy wire form.
    pub fn register_user(registration: &Registration) -> Result<Self> {
        let email = registration.email.trim().to_lowercase();
        require(&email, "Email dan password wajib diisi")?;
        require(&registration.password, "Email dan password wajib diisi")?;
        require(&registration.name, "Nama wajib diisi")?;
        if !validate_email(&email) {
            return Err(Error::validation("Format email tidak valid"));
        }
        if registration.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::validation("Password minimal 8 karakter"));
        }
        if registration.role == Role::Partner {
            require(&registration.address, "Lokasi mitra wajib diisi")?;
            require(&registration.owner_name, "Nama pemilik wajib diisi")?;
        }
        let password = to_legacy_wire_form(&registration.password)
            .map_err(|err| Error::validation(err.to_string()))?;

        let phone: String = registration
            .phone
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .trim_start_matches('0')
            .to_string();
        let avatar = registration.avatar.clone().unwrap_or_else(|| {
            format!(
                "https://ui-avatars.com/api/?name={}&background=random",
                urlencoding::encode(&registration.name)
            )
        });
        let now = chrono::Utc::now().to_rfc3339();
        let name = registration.name.trim();
        let address = registration.address.trim();
        let owner = registration.owner_name.trim();

        Ok(Self::new(
            "register_user",
            json!({
                "id": "",
                "name": name,
                "email": email,
                "password": password,
                "role": registration.role.as_wire(),
                "phone": phone,
                "avatar": avatar,
                "address": address,
                "ownerName": owner,
                "Nama Pemilik": owner,
                "nama_pemilik": owner,
                "owner_name": owner,
                "Alamat": address,
                "alamat": address,
                "Link Maps": address,
                "link_maps": address,
                "Nama Toko": name,
                "nama_toko": name,
                "status": "ACTIVE",
                "createdAt": now,
                "updatedAt": now,
                "Created At": now,
                "Updated At": now,
            }),
        ))
    }

    pub fn create_order(order: &NewOrder, user: &User) -> Result<Self> {
        require(&user.email, "Data order tidak lengkap")?;
        require(&order.partner, "Data order tidak lengkap")?;
        require(&order.item, "Data order tidak lengkap")?;
        if order.quantity == 0 {
            return Err(Error::validation("Jumlah minimal 1"));
        }
        let unit = if order.unit.trim().is_empty() {
            DEFAULT_AMOUNT_UNIT
        } else {
            order.unit.trim()
        };
        let user_name = if user.name.trim().is_empty() {
            "Guest"
        } else {
            user.name.as_str()
        };
        let total_price = if order.total_price.trim().is_empty() {
            "0"
        } else {
            order.total_price.as_str()
        };
        let payment_method = if order.payment_method.trim().is_empty() {
            "CASH"
        } else {
            order.payment_method.as_str()
        };

        Ok(Self::new(
            "create_order",
            json!({
                "userName": user_name,
                "userEmail": user.email,
                "userId": user.email,
                "partner": order.partner,
                "partnerId": order.partner_id,
                "item": order.item,
                "itemId": order.item_id,
                "quantity": format!("{} {}", order.quantity, unit),
                "status": OrderStatus::Active.as_wire(),
                "totalPrice": total_price,
                "deliveryAddress": order.delivery_address,
                "paymentMethod": payment_method,
            }),
        ))
    }

    pub fn add_inventory(item: &NewInventoryItem, partner_name: &str) -> Result<Self> {
        require(&item.name, "Nama produk dan partner wajib diisi")?;
        require(partner_name, "Nama produk dan partner wajib diisi")?;
        let category = if item.category.trim().is_empty() {
            FALLBACK_LISTING_CATEGORY
        } else {
            item.category.as_str()
        };
        let unit = if item.amount_unit.trim().is_empty() {
            DEFAULT_AMOUNT_UNIT
        } else {
            item.amount_unit.as_str()
        };
        let quality = item
            .effective_quality_percentage()
            .map(Value::from)
            .unwrap_or_else(|| Value::from("N/A"));

        Ok(Self::new(
            "add_inventory",
            json!({
                "partnerName": partner_name,
                "name": item.name,
                "category": category,
                "amountValue": item.amount_value,
                "amountUnit": unit,
                "status": DEFAULT_ITEM_STATUS,
                "qualityPercentage": quality,
                "image": item.image,
                "price": item.price,
                "description": item.description,
                "shelfLife": item.shelf_life,
                "location": item.location,
            }),
        ))
    }
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(message));
    }
    Ok(())
}

fn default_text(object: &mut Map<String, Value>, key: &str, fallback: &str) {
    let missing = match object.get(key) {
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Null) | None => true,
        Some(_) => false,
    };
    if missing {
        object.insert(key.to_string(), Value::from(fallback));
    }
}
