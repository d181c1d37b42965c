use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value as JsonValue;

use crate::{
    error::ErrorDetails,
    types::{Envelope, ErrorPayload},
    ApiError, Result,
};

/// Successful response bodies arrive either as the rich envelope or as a
/// bare payload; the variant order makes the `success` discriminant decide.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireBody {
    Envelope(Envelope<JsonValue>),
    Raw(JsonValue),
}

/// Non-success bodies arrive in one of two shapes: nested
/// `{"error": {"message", "errors", "code"}}` or flat
/// `{"error"|"message", "errors"}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireErrorBody {
    Nested {
        error: ErrorPayload,
    },
    Flat {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        errors: Option<BTreeMap<String, Vec<String>>>,
    },
}

impl WireErrorBody {
    fn into_details(self, status: u16) -> ErrorDetails {
        match self {
            Self::Nested { error } => ErrorDetails {
                status,
                message: error.message,
                errors: error.errors,
                code: error.code,
            },
            Self::Flat {
                error,
                message,
                errors,
            } => ErrorDetails {
                status,
                message: error
                    .or(message)
                    .unwrap_or_else(|| default_message(status)),
                errors,
                code: None,
            },
        }
    }
}

/// Maps a successful HTTP response body into the uniform envelope.
///
/// JSON bodies that already carry the `success` discriminant are returned
/// as-is (the backend opts into the richer envelope per endpoint); any other
/// payload is wrapped as `{success: true, data: payload}`. Non-JSON bodies
/// are treated as opaque text.
pub(crate) fn normalize_success(
    content_type: Option<&str>,
    body: &str,
) -> Result<Envelope<JsonValue>> {
    if !is_json_content_type(content_type) {
        let data = (!body.is_empty()).then(|| JsonValue::String(body.to_owned()));
        return Ok(wrap_raw(data));
    }

    if body.trim().is_empty() {
        return Ok(wrap_raw(None));
    }

    let wire = serde_json::from_str::<WireBody>(body)
        .map_err(|err| ApiError::Decode(format!("invalid response JSON: {err}; body: {body}")))?;

    Ok(match wire {
        WireBody::Envelope(envelope) => envelope,
        WireBody::Raw(payload) => wrap_raw(Some(payload)),
    })
}

/// Normalizes either backend error payload shape into one [`ErrorDetails`].
/// Unparseable bodies fall back to the body text, then to the canonical
/// status reason.
pub(crate) fn normalize_error(status: u16, body: &str) -> ErrorDetails {
    match serde_json::from_str::<WireErrorBody>(body) {
        Ok(shape) => shape.into_details(status),
        Err(_) => {
            let trimmed = body.trim();
            ErrorDetails {
                status,
                message: if trimmed.is_empty() {
                    default_message(status)
                } else {
                    trimmed.to_owned()
                },
                errors: None,
                code: None,
            }
        }
    }
}

/// Projects the normalized envelope onto the caller's payload type.
/// A JSON `null` data field is treated as absent.
pub(crate) fn into_typed<T: DeserializeOwned>(envelope: Envelope<JsonValue>) -> Result<Envelope<T>> {
    let data = envelope
        .data
        .filter(|value| !value.is_null())
        .map(|value| {
            serde_json::from_value::<T>(value).map_err(|err| {
                ApiError::Decode(format!("response data did not match the expected shape: {err}"))
            })
        })
        .transpose()?;

    Ok(Envelope {
        success: envelope.success,
        data,
        message: envelope.message,
        error: envelope.error,
        errors: envelope.errors,
        meta: envelope.meta,
    })
}

fn wrap_raw(data: Option<JsonValue>) -> Envelope<JsonValue> {
    Envelope {
        success: true,
        data,
        message: None,
        error: None,
        errors: None,
        meta: None,
    }
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| {
        let essence = value.split(';').next().unwrap_or(value).trim();
        essence.eq_ignore_ascii_case("application/json")
            || essence.to_ascii_lowercase().ends_with("+json")
    })
}

fn default_message(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("request failed with status {status}"))
}
