//! Typed caller-supplied metadata
//!
//! Extra attributes attached to an item are restricted to a closed set of
//! primitive value types so that the on-disk catalog format stays stable.
//! Uses the default externally-tagged serde representation so MessagePack
//! round-trips preserve the variant; JSON adapters convert through
//! [`MetadataValue::from_json`] and [`MetadataValue::to_json`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{XmodalError, XmodalResult};

/// Open mapping of attribute name to primitive value
///
/// BTreeMap keeps serialization byte-stable across saves.
pub type ExtraMetadata = BTreeMap<String, MetadataValue>;

/// Reserved key: name of the encoder that produced the embedding
pub const ENCODER_KEY: &str = "encoder";
/// Reserved key: original filename supplied by the uploader
pub const ORIGINAL_FILENAME_KEY: &str = "original_filename";
/// Reserved key: free-form user description
pub const DESCRIPTION_KEY: &str = "description";

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    /// UTF-8 string
    String(String),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
}

impl MetadataValue {
    /// Borrow the string payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert from a JSON value
    ///
    /// Strings, numbers and booleans are accepted. Integers that fit in
    /// `i64` stay integers; other numbers become floats. Null, arrays and
    /// objects are rejected.
    pub fn from_json(value: &serde_json::Value) -> XmodalResult<Self> {
        match value {
            serde_json::Value::String(s) => Ok(MetadataValue::String(s.clone())),
            serde_json::Value::Bool(b) => Ok(MetadataValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(MetadataValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(MetadataValue::Float(f))
                } else {
                    Err(XmodalError::validation(format!(
                        "metadata number out of range: {}",
                        n
                    )))
                }
            }
            serde_json::Value::Null => Err(XmodalError::validation(
                "metadata values cannot be null",
            )),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
                XmodalError::validation("metadata values must be scalars"),
            ),
        }
    }

    /// Convert to a JSON value (timestamps become RFC 3339 strings)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetadataValue::String(s) => serde_json::Value::String(s.clone()),
            MetadataValue::Integer(i) => serde_json::Value::from(*i),
            MetadataValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            MetadataValue::Bool(b) => serde_json::Value::Bool(*b),
            MetadataValue::Timestamp(t) => serde_json::Value::String(t.to_rfc3339()),
        }
    }
}

/// Convert a JSON object into typed metadata
///
/// Fails on the first non-scalar value, naming its key.
pub fn extra_from_json(
    object: &serde_json::Map<String, serde_json::Value>,
) -> XmodalResult<ExtraMetadata> {
    object
        .iter()
        .map(|(k, v)| {
            MetadataValue::from_json(v)
                .map(|mv| (k.clone(), mv))
                .map_err(|e| XmodalError::validation(format!("metadata key '{}': {}", k, e)))
        })
        .collect()
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::String(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::String(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Integer(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

impl From<DateTime<Utc>> for MetadataValue {
    fn from(v: DateTime<Utc>) -> Self {
        MetadataValue::Timestamp(v)
    }
}
