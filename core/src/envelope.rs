//! The `{ success, message, data }` shape every endpoint answers with.
//!
//! # Design
//! `data` stays a `serde_json::Value` by default so list payloads reach the
//! caller exactly as the server sent them. Pagination is only detected, never
//! reshaped; `decode_data` turns the payload into a DTO when the caller asks.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Uniform response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Pagination fields found in a list payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub total_pages: u64,
    /// Length of the nested `data` list.
    pub len: usize,
}

impl<T> Envelope<T> {
    /// A synthesized failure envelope with no payload.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl Envelope<Value> {
    /// Detect `{ total, totalPages, data: [...] }` in the payload.
    pub fn pagination(&self) -> Option<Pagination> {
        let data = self.data.as_ref()?.as_object()?;
        let total = data.get("total")?.as_u64()?;
        let total_pages = data.get("totalPages")?.as_u64()?;
        let len = data.get("data")?.as_array()?.len();
        Some(Pagination {
            total,
            total_pages,
            len,
        })
    }

    /// The nested list of a paginated payload, or the payload itself when it
    /// is a bare array.
    pub fn items(&self) -> Option<&[Value]> {
        match self.data.as_ref()? {
            Value::Array(items) => Some(items),
            Value::Object(map) => map.get("data")?.as_array().map(Vec::as_slice),
            _ => None,
        }
    }

    /// Deserialize the payload into `T`. `Ok(None)` when there is no payload.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.data.clone().map(serde_json::from_value).transpose()
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
