//! Typed values and documents for the cloud store wire format
//!
//! A stored document is a map of self-describing values; each value is a
//! JSON object with exactly one type-tagged key, like
//! `{"stringValue": "Baches"}`. Integers travel string-encoded.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A single typed field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// UTF-8 string
    #[serde(rename = "stringValue")]
    String(String),
    /// 64-bit integer, string-encoded on the wire
    #[serde(rename = "integerValue")]
    Integer(#[serde(with = "integer_string")] i64),
    /// Boolean
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    /// RFC 3339 timestamp
    #[serde(rename = "timestampValue")]
    Timestamp(DateTime<Utc>),
    /// Explicit null
    #[serde(rename = "nullValue")]
    Null(()),
}

impl FieldValue {
    /// Build a string value
    pub fn str(value: impl Into<String>) -> Self {
        FieldValue::String(value.into())
    }

    /// The contained string, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

mod integer_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A stored document together with its server-assigned metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource path of the document
    pub name: String,
    /// Typed payload fields
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    /// Server-assigned creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    /// Server-assigned last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// The document id: the last segment of the resource path
    pub fn id(&self) -> &str {
        self.name.split('/').next_back().unwrap_or(&self.name)
    }

    /// A string field, if present
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(FieldValue::as_str)
    }

    /// A string field that the typed model cannot do without
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.str_field(key).ok_or_else(|| {
            CoreError::InvalidDocument(format!("document {} missing field {key}", self.id()))
        })
    }
}

/// Build a fields map from (name, value) pairs
pub fn fields_from(pairs: impl IntoIterator<Item = (&'static str, FieldValue)>) -> BTreeMap<String, FieldValue> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
