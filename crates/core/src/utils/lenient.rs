//! Forgiving deserializers for spreadsheet-backed rows.
//!
//! The backend stores everything in sheet cells, so a phone number may come
//! back as a number, a quantity as `"3"` and a score as `"N/A"`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Any scalar as a string; `null` becomes empty.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

/// Non-negative integer from a number or numeric string, otherwise 0.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value)
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.min(f64::from(u32::MAX)) as u32)
        .unwrap_or(0))
}

/// Percentage clamped to 0..=100; anything non-numeric ("N/A", null) is `None`.
pub fn percentage<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value)
        .filter(|v| v.is_finite())
        .map(clamp_percentage))
}

/// Percentage clamped to 0..=100, with non-numeric values read as 0.
pub fn required_percentage<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(percentage(deserializer)?.unwrap_or(0))
}

/// Rating/boolean cells: `true`, `"true"`, `1`, `"1"`.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

/// Decodes each element on its own, skipping (and logging) the malformed ones.
pub fn rows<T>(values: Vec<Value>, what: &str) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(row) => Some(row),
            Err(err) => {
                log::warn!("Skipping malformed {} row: {}", what, err);
                None
            }
        })
        .collect()
}

/// List field whose malformed elements are dropped instead of failing the
/// whole document; `null` reads as empty.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(values) => Ok(rows(values, std::any::type_name::<T>())),
        _ => Ok(Vec::new()),
    }
}

pub fn clamp_percentage(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
