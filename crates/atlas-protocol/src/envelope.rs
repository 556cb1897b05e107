//! Wire envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolResult;

pub const DEFAULT_NAMESPACE: &str = "threejs";

/// Inbound `{type, id, payload}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque correlation id echoed back on the response.
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub payload: Value,
}

impl CommandEnvelope {
    pub fn new(kind: impl Into<String>, id: impl Into<Value>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            payload,
        }
    }

    /// Decode an envelope given either as an object or as JSON text inside a
    /// string.
    pub fn from_value(value: Value) -> ProtocolResult<Self> {
        match value {
            Value::String(text) => Self::from_json(&text),
            other => Ok(serde_json::from_value(other)?),
        }
    }

    pub fn from_json(text: &str) -> ProtocolResult<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }
}

/// Outbound `{type, id, success, data, error}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Value,
    pub success: bool,
    pub data: Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn response_type(namespace: &str) -> String {
        format!("{namespace}_response")
    }

    pub fn ok(namespace: &str, id: Value, data: Value) -> Self {
        Self {
            kind: Self::response_type(namespace),
            id,
            success: true,
            data,
            error: None,
        }
    }

    pub fn failed(namespace: &str, id: Value, error: impl Into<String>) -> Self {
        Self {
            kind: Self::response_type(namespace),
            id,
            success: false,
            data: Value::Null,
            error: Some(error.into()),
        }
    }
}
