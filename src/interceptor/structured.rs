//! Conversion of call payloads into structured snapshot values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key used when a payload does not serialize to a JSON object.
const SCALAR_KEY: &str = "value";

/// A generic structured value, shaped like a protobuf `Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<StructValue>),
    Struct(BTreeMap<String, StructValue>),
}

impl From<serde_json::Value> for StructValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            // Numbers without a finite f64 form cannot be represented.
            serde_json::Value::Number(n) => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(fields) => Self::Struct(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for StructValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Take a structured snapshot of a payload.
///
/// Fields that have no structured form become [`StructValue::Null`]. A
/// payload that does not serialize at all yields `None`, and one that is not
/// an object is stored under the key `"value"`.
pub fn to_struct<T: Serialize + ?Sized>(payload: &T) -> Option<BTreeMap<String, StructValue>> {
    let value = match serde_json::to_value(payload) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Payload has no structured form, omitting snapshot");
            return None;
        }
    };

    match StructValue::from(value) {
        StructValue::Struct(fields) => Some(fields),
        other => Some(BTreeMap::from([(SCALAR_KEY.to_string(), other)])),
    }
}
