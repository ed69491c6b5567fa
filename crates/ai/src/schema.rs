//! Response schema sent with structured analysis requests.

use serde_json::{json, Value};

use foodrescue_core::models::IngredientCategory;

/// Schema of a [`QualityAnalysis`](foodrescue_core::models::QualityAnalysis)
/// in the model API's OpenAPI subset.
pub(crate) fn quality_analysis_schema() -> Value {
    let categories: Vec<&str> = IngredientCategory::ALL
        .iter()
        .map(IngredientCategory::as_wire)
        .collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "isSafe": { "type": "BOOLEAN" },
            "isHalal": { "type": "BOOLEAN" },
            "halalReasoning": { "type": "STRING" },
            "reasoning": { "type": "STRING" },
            "allergens": { "type": "ARRAY", "items": { "type": "STRING" } },
            "shelfLifePrediction": { "type": "STRING" },
            "hygieneScore": { "type": "INTEGER" },
            "qualityPercentage": { "type": "INTEGER" },
            "detectedItems": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "category": { "type": "STRING", "enum": categories }
                    },
                    "required": ["name", "category"]
                }
            },
            "storageTips": { "type": "ARRAY", "items": { "type": "STRING" } },
            "environmentalImpact": {
                "type": "OBJECT",
                "properties": {
                    "co2Saved": { "type": "STRING" },
                    "waterSaved": { "type": "STRING" }
                },
                "required": ["co2Saved", "waterSaved"]
            }
        },
        "required": [
            "isSafe", "isHalal", "halalReasoning", "reasoning", "hygieneScore",
            "qualityPercentage", "detectedItems", "shelfLifePrediction",
            "allergens", "storageTips", "environmentalImpact"
        ]
    })
}

/// Schema of the address components split out of a free-text address.
pub(crate) fn address_parts_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "streetName": { "type": "STRING" },
            "city": { "type": "STRING" },
            "province": { "type": "STRING" },
            "postalCode": { "type": "STRING" },
            "rt": { "type": "STRING" },
            "rw": { "type": "STRING" }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_enum_lists_every_wire_value() {
        let schema = quality_analysis_schema();
        let categories = &schema["properties"]["detectedItems"]["items"]["properties"]["category"]
            ["enum"];
        assert_eq!(categories.as_array().unwrap().len(), 8);
        assert_eq!(categories[0], "Buah");
        assert_eq!(categories[7], "Lainnya");
    }
}
