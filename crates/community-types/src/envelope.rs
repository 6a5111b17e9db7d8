use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response wrapper used by every JSON endpoint.
///
/// `{ "success": true, "data": ..., "message": "...", "code": "..." }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Envelope {
    /// Returns the payload of a response body.
    ///
    /// Bodies that are objects with a `data` key yield that value; anything
    /// else is returned unchanged.
    pub fn unwrap_data(body: Value) -> Value {
        match body {
            Value::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        }
    }

    /// Extracts the server-provided `message` from an error body.
    pub fn message_of(body: &Value) -> Option<&str> {
        body.get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
    }

    /// Extracts the server-provided `code` from an error body.
    pub fn code_of(body: &Value) -> Option<&str> {
        body.get("code").and_then(Value::as_str)
    }
}
