use std::collections::BTreeMap;

use serde::Deserialize;

/// Uniform response wrapper returned by every client call, regardless of the
/// backend's native response shape.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Envelope<T> {
    /// Whether the backend reports the call as successful.
    pub success: bool,
    /// Response payload, when present.
    #[serde(default)]
    pub data: Option<T>,
    /// Human-readable status message.
    #[serde(default)]
    pub message: Option<String>,
    /// Error payload. Endpoints send either a bare string or a structured
    /// object; both are preserved here.
    #[serde(default)]
    pub error: Option<ErrorField>,
    /// Field-level validation errors, keyed by field name.
    #[serde(default)]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    /// Pagination metadata for list endpoints.
    #[serde(default)]
    pub meta: Option<Meta>,
}

/// Backend error field in either of its wire forms.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ErrorField {
    Text(String),
    Detail(ErrorPayload),
}

/// Structured backend error object.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default)]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Pagination metadata for list endpoints.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Meta {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(rename = "totalPages", default)]
    pub total_pages: Option<u64>,
}
