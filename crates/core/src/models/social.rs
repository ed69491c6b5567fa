use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RecordId;
use crate::utils::lenient;

/// A recipient's rating of a fulfilled order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub order_id: RecordId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub partner_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub product_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub user: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub user_email: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub rating: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub comment: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    /// Columns this client does not model, kept so cached rows stay intact.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A moderation report (admin-visible).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, alias = "userId", deserialize_with = "lenient::string")]
    pub reporter_email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub report_type: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub reason: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub message: String,
    #[serde(default, rename = "type", deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Review form input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewReview {
    pub order_id: RecordId,
    pub partner_name: String,
    pub product_name: String,
    pub rating: u32,
    pub comment: String,
}

/// Report form input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewReport {
    pub report_type: Option<String>,
    pub title: Option<String>,
    pub reason: String,
    pub description: String,
    pub target_item_id: Option<RecordId>,
}

/// A recipient asking nearby partners for a specific food.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FoodRequest {
    pub food_name: String,
    pub budget: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_review_columns_survive_a_cache_round_trip() {
        let review: Review = serde_json::from_str(
            r#"{"id": 3, "rating": "5", "comment": "Enak", "photo": "x.jpg"}"#,
        )
        .unwrap();
        assert_eq!(review.rating, 5);
        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["photo"], "x.jpg");
        assert_eq!(json["id"], "3");
    }

    #[test]
    fn notification_type_and_read_flag() {
        let n: Notification =
            serde_json::from_str(r#"{"id":"N1","type":"ORDER","isRead":"true"}"#).unwrap();
        assert_eq!(n.kind, "ORDER");
        assert!(n.is_read);
    }
}
