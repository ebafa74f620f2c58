//! Data models for analytics beacons and the rows they produce

use serde::{Deserialize, Serialize};

/// Pageview beacon as sent by the browser
///
/// Every field is optional at the deserialization level so that a missing
/// `url` is reported as a validation error rather than a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageviewBeacon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl PageviewBeacon {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// Custom event beacon as sent by the browser
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBeacon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl EventBeacon {
    pub fn new(event_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            event_name: Some(event_name.into()),
            event_data: None,
            url: Some(url.into()),
        }
    }
}

/// A validated pageview ready to be inserted
#[derive(Debug, Clone)]
pub struct NewPageview {
    pub url: String,
    pub referrer: Option<String>,
    pub title: Option<String>,
    pub screen: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub visitor_hash: String,
    pub user_agent: String,
    /// Unix timestamp (seconds), assigned by the server
    pub created_at: i64,
}

/// A validated event ready to be inserted
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub event_name: String,
    /// Event payload serialized as JSON text
    pub event_data: Option<String>,
    pub url: String,
    pub visitor_hash: String,
    pub created_at: i64,
}

/// Trim a beacon field, mapping empty strings to `None`
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Serialize an event payload, dropping falsy values
///
/// `null`, `false`, `0` and `""` carry no payload and are stored as NULL.
/// Empty objects and arrays are kept.
pub fn event_payload(data: Option<serde_json::Value>) -> Option<String> {
    use serde_json::Value;

    data.filter(|value| match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
    .map(|value| value.to_string())
}
