use serde::{Deserialize, Serialize};

use super::{QualityAnalysis, RecordId};
use crate::utils::lenient;

pub const DEFAULT_AMOUNT_UNIT: &str = "Porsi";
pub const DEFAULT_ITEM_STATUS: &str = "Buka";
pub const DEFAULT_PRODUCT_CATEGORY: &str = "Makanan Berat";

/// A listed surplus-food offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub partner_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    /// Combined amount as stored by the backend, e.g. `"5 Porsi"`.
    #[serde(default, deserialize_with = "lenient::string")]
    pub amount: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub amount_value: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub amount_unit: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::percentage")]
    pub quality_percentage: Option<u8>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub image: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub shelf_life: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub timestamp: String,
}

/// Splits `"5 Porsi"` into `(5, "Porsi")`.
///
/// The leading digit run is the value; whatever follows (trimmed) is the
/// unit, defaulting to [`DEFAULT_AMOUNT_UNIT`]. Without a leading number all
/// digits in the string are used as the value.
pub fn parse_amount(raw: &str) -> (u32, String) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (0, DEFAULT_AMOUNT_UNIT.to_string());
    }

    if let Some(start) = trimmed.find(|c: char| c.is_ascii_digit()) {
        let rest = &trimmed[start..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let value = rest[..end].parse::<u32>().unwrap_or(0);
        let unit = rest[end..].trim();
        let unit = if unit.is_empty() {
            DEFAULT_AMOUNT_UNIT.to_string()
        } else {
            unit.to_string()
        };
        return (value, unit);
    }

    (0, DEFAULT_AMOUNT_UNIT.to_string())
}

impl InventoryItem {
    /// Fills derived fields the backend leaves out.
    pub fn normalized(mut self) -> Self {
        if !self.amount.trim().is_empty() {
            let (value, unit) = parse_amount(&self.amount);
            self.amount_value = value;
            self.amount_unit = unit;
        } else if self.amount_unit.is_empty() {
            self.amount_unit = DEFAULT_AMOUNT_UNIT.to_string();
        }
        if self.status.is_empty() {
            self.status = DEFAULT_ITEM_STATUS.to_string();
        }
        if self.timestamp.is_empty() {
            self.timestamp = chrono::Utc::now().to_rfc3339();
        }
        self
    }

    /// Decrements the available amount, never below zero.
    pub fn reserve(&mut self, quantity: u32) {
        self.amount_value = self.amount_value.saturating_sub(quantity);
        self.amount = format!("{} {}", self.amount_value, self.amount_unit)
            .trim()
            .to_string();
    }
}

/// A product about to be listed by a partner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewInventoryItem {
    pub name: String,
    pub category: String,
    pub amount_value: u32,
    pub amount_unit: String,
    pub image: String,
    pub price: String,
    pub description: String,
    pub shelf_life: String,
    pub location: String,
    /// AI verdict backing this listing, when the product went through a
    /// quality check first.
    pub quality: Option<QualityAnalysis>,
    /// Score carried over from a staged draft without the full verdict.
    pub quality_percentage: Option<u8>,
}

impl NewInventoryItem {
    pub fn effective_quality_percentage(&self) -> Option<u8> {
        self.quality
            .as_ref()
            .map(|q| q.quality_percentage)
            .or(self.quality_percentage)
    }

    /// The local row added after the backend accepted the listing.
    pub fn into_item(self, id: RecordId, partner_name: &str) -> InventoryItem {
        let unit = if self.amount_unit.is_empty() {
            DEFAULT_AMOUNT_UNIT.to_string()
        } else {
            self.amount_unit.clone()
        };
        let quality_percentage = self.effective_quality_percentage();
        InventoryItem {
            id,
            partner_name: partner_name.to_string(),
            name: self.name,
            category: self.category,
            amount: format!("{} {}", self.amount_value, unit),
            amount_value: self.amount_value,
            amount_unit: unit,
            status: DEFAULT_ITEM_STATUS.to_string(),
            quality_percentage,
            image: self.image,
            price: self.price,
            description: self.description,
            shelf_life: self.shelf_life,
            location: self.location,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Values handed from a quality check to the upload form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub image: String,
    pub quality_percentage: Option<u8>,
    pub description: String,
    pub shelf_life: String,
}
