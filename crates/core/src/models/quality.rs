use serde::{Deserialize, Serialize};

use super::{ProductDraft, DEFAULT_PRODUCT_CATEGORY};
use crate::utils::lenient;

/// Minimum AI quality score for an item to be listed.
pub const QUALIFYING_QUALITY_PERCENTAGE: u8 = 60;

/// Ingredient category enum fixed by the analysis schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngredientCategory {
    #[serde(rename = "Buah")]
    Fruit,
    #[serde(rename = "Sayur")]
    Vegetable,
    #[serde(rename = "Protein")]
    Protein,
    #[serde(rename = "Karbohidrat")]
    Carbohydrate,
    #[serde(rename = "Olahan")]
    Processed,
    #[serde(rename = "Roti")]
    Bread,
    #[serde(rename = "Bumbu")]
    Seasoning,
    #[serde(rename = "Lainnya", other)]
    Other,
}

impl IngredientCategory {
    pub const ALL: [IngredientCategory; 8] = [
        IngredientCategory::Fruit,
        IngredientCategory::Vegetable,
        IngredientCategory::Protein,
        IngredientCategory::Carbohydrate,
        IngredientCategory::Processed,
        IngredientCategory::Bread,
        IngredientCategory::Seasoning,
        IngredientCategory::Other,
    ];

    pub fn as_wire(&self) -> &'static str {
        match self {
            IngredientCategory::Fruit => "Buah",
            IngredientCategory::Vegetable => "Sayur",
            IngredientCategory::Protein => "Protein",
            IngredientCategory::Carbohydrate => "Karbohidrat",
            IngredientCategory::Processed => "Olahan",
            IngredientCategory::Bread => "Roti",
            IngredientCategory::Seasoning => "Bumbu",
            IngredientCategory::Other => "Lainnya",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedItem {
    pub name: String,
    pub category: IngredientCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalImpact {
    #[serde(default)]
    pub co2_saved: String,
    #[serde(default)]
    pub water_saved: String,
}

/// Structured verdict of the AI image analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QualityAnalysis {
    pub is_safe: bool,
    pub is_halal: bool,
    #[serde(default)]
    pub halal_reasoning: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, deserialize_with = "lenient::required_percentage")]
    pub quality_percentage: u8,
    #[serde(default, deserialize_with = "lenient::required_percentage")]
    pub hygiene_score: u8,
    #[serde(default)]
    pub shelf_life_prediction: String,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub detected_items: Vec<DetectedItem>,
    #[serde(default)]
    pub storage_tips: Vec<String>,
    #[serde(default)]
    pub environmental_impact: EnvironmentalImpact,
}

impl QualityAnalysis {
    /// Listing gate: quality at or above the threshold AND halal.
    pub fn is_qualified(&self) -> bool {
        self.quality_percentage >= QUALIFYING_QUALITY_PERCENTAGE && self.is_halal
    }
}

/// One entry of the quality-check history (most recent first in state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityCheckRecord {
    pub id: String,
    #[serde(flatten)]
    pub analysis: QualityAnalysis,
    /// Analysed image as a `data:image/jpeg;base64,...` URL.
    #[serde(default, rename = "image")]
    pub image_data_url: String,
    pub timestamp: String,
}

impl QualityCheckRecord {
    /// Prefill for the upload form from this check.
    pub fn to_product_draft(&self) -> ProductDraft {
        let first = self.analysis.detected_items.first();
        let description = if self.analysis.reasoning.is_empty() {
            "Diverifikasi oleh AI".to_string()
        } else {
            self.analysis.reasoning.clone()
        };
        ProductDraft {
            name: first.map(|item| item.name.clone()).unwrap_or_default(),
            category: first
                .map(|item| item.category.as_wire().to_string())
                .unwrap_or_else(|| DEFAULT_PRODUCT_CATEGORY.to_string()),
            image: self.image_data_url.clone(),
            quality_percentage: Some(self.analysis.quality_percentage),
            description,
            shelf_life: self.analysis.shelf_life_prediction.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(quality: u8, halal: bool) -> QualityAnalysis {
        QualityAnalysis {
            is_safe: true,
            is_halal: halal,
            quality_percentage: quality,
            ..QualityAnalysis::default()
        }
    }

    #[test]
    fn low_quality_is_not_qualified() {
        assert!(!analysis(45, true).is_qualified());
    }

    #[test]
    fn non_halal_is_not_qualified() {
        assert!(!analysis(75, false).is_qualified());
    }

    #[test]
    fn halal_and_good_quality_is_qualified() {
        assert!(analysis(75, true).is_qualified());
        assert!(analysis(60, true).is_qualified());
        assert!(!analysis(59, true).is_qualified());
    }

    #[test]
    fn unknown_category_reads_as_other() {
        let item: DetectedItem =
            serde_json::from_str(r#"{"name":"Tempe","category":"Fermentasi"}"#).unwrap();
        assert_eq!(item.category, IngredientCategory::Other);
    }

    #[test]
    fn draft_takes_first_detected_item() {
        let record = QualityCheckRecord {
            id: "qc-1".into(),
            analysis: QualityAnalysis {
                reasoning: "Segar".into(),
                shelf_life_prediction: "2 hari".into(),
                detected_items: vec![DetectedItem {
                    name: "Roti Tawar".into(),
                    category: IngredientCategory::Bread,
                }],
                ..analysis(80, true)
            },
            image_data_url: "data:image/jpeg;base64,AAAA".into(),
            timestamp: "2026-01-01T00:00:00Z".into(),
        };
        let draft = record.to_product_draft();
        assert_eq!(draft.name, "Roti Tawar");
        assert_eq!(draft.category, "Roti");
        assert_eq!(draft.quality_percentage, Some(80));
        assert_eq!(draft.description, "Segar");
    }
}
