use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::lenient;

/// Message used when the backend could not be reached at all.
pub const CONNECTION_FAILED_MESSAGE: &str =
    "Gagal terhubung ke server. Pastikan koneksi internet stabil.";

/// Response shape shared by every backend action.
///
/// Success is signalled either by `success: true` or by
/// `status: "success"`; action-specific values sit next to these keys and
/// are kept in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Envelope {
    /// A bare `{success: true}`.
    pub fn ok() -> Self {
        Self {
            success: Some(Value::Bool(true)),
            ..Default::default()
        }
    }

    /// The normalized failure every transport problem is turned into.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: Some(Value::Bool(false)),
            message: Some(Value::String(message.into())),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.success, Some(Value::Bool(true)))
            || matches!(&self.status, Some(Value::String(s)) if s == "success")
    }

    /// Connectivity check result: `status: "ready"` or a plain success.
    pub fn is_ready(&self) -> bool {
        matches!(self.success, Some(Value::Bool(true)))
            || matches!(&self.status, Some(Value::String(s)) if s == "ready")
    }

    pub fn message(&self) -> Option<&str> {
        match &self.message {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// The backend message, or `fallback` when there is none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message().unwrap_or(fallback).to_string()
    }

    /// Action-specific value, looked up beside the status keys first and
    /// then inside an object `data`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields
            .get(key)
            .or_else(|| self.data.as_ref().and_then(|data| data.get(key)))
            .filter(|value| !value.is_null())
    }

    /// A field rendered as a string (numbers included); empty is `None`.
    pub fn field_string(&self, key: &str) -> Option<String> {
        let value = self.field(key)?;
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    /// Rows of a successful list response. `None` when the call failed or
    /// `data` is not a list; malformed rows are skipped.
    pub fn rows<T>(&self, what: &str) -> Option<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        if !self.is_ok() {
            return None;
        }
        match &self.data {
            Some(Value::Array(values)) => Some(lenient::rows(values.clone(), what)),
            _ => None,
        }
    }
}
