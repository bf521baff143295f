//! Untyped reverse-geocoding response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::GeocodeError;

/// Provider JSON as returned by a Nominatim-compatible `/reverse` endpoint.
///
/// The document is kept untyped so fields the normalizer does not know about
/// (OSM ids, licence, extra tags) survive for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAddressPayload(Value);

impl RawAddressPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parses a response body. The top-level value must be a JSON object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GeocodeError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| GeocodeError::Parse(e.to_string()))?;
        if !value.is_object() {
            return Err(GeocodeError::Parse(format!(
                "expected a JSON object, got {}",
                json_type_name(&value)
            )));
        }
        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The `address` component map, if present.
    pub fn address(&self) -> Option<&Map<String, Value>> {
        self.0.get("address").and_then(Value::as_object)
    }

    /// A single `address` component as text.
    ///
    /// Numbers are stringified; empty strings and other JSON types are absent.
    pub fn address_field(&self, name: &str) -> Option<String> {
        self.address().and_then(|a| a.get(name)).and_then(text_of)
    }

    /// OSM feature class (`place`, `shop`, `highway`, ...).
    pub fn class(&self) -> Option<&str> {
        self.str_field("class")
    }

    /// OSM feature type (`house`, `mall`, `residential`, ...).
    pub fn kind(&self) -> Option<&str> {
        self.str_field("type")
    }

    pub fn display_name(&self) -> Option<&str> {
        self.str_field("display_name")
    }

    /// Provider error message, e.g. `"Unable to geocode"` for open water.
    pub fn error_message(&self) -> Option<&str> {
        self.str_field("error")
    }

    /// `[south, north, west, east]` from the `boundingbox` array.
    ///
    /// Nominatim sends the bounds as strings; numeric entries are accepted too.
    pub fn bounding_box(&self) -> Option<[f64; 4]> {
        let items = self.0.get("boundingbox")?.as_array()?;
        if items.len() != 4 {
            return None;
        }
        let mut bounds = [0.0; 4];
        for (slot, item) in bounds.iter_mut().zip(items) {
            *slot = match item {
                Value::Number(n) => n.as_f64()?,
                Value::String(s) => s.trim().parse().ok()?,
                _ => return None,
            };
        }
        Some(bounds)
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl From<Value> for RawAddressPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
