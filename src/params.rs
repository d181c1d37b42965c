use reqwest::Method;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{ApiError, Result};

/// Scalar query-parameter value.
///
/// Absent values and empty text are omitted from the request URL entirely
/// rather than serialized as `key=`. Filtering on "absent" and filtering on
/// "empty" are distinct states; neither reaches the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Absent,
}

impl Scalar {
    pub(crate) fn render(&self) -> Option<String> {
        match self {
            Self::Text(value) if value.is_empty() => None,
            Self::Text(value) => Some(value.clone()),
            Self::Integer(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Bool(value) => Some(value.to_string()),
            Self::Absent => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<V: Into<Scalar>> From<Option<V>> for Scalar {
    fn from(value: Option<V>) -> Self {
        value.map(Into::into).unwrap_or(Self::Absent)
    }
}

/// Ordered query-parameter map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query(Vec<(String, Scalar)>);

impl Query {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a parameter. Absent and empty values are dropped at render time.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub(crate) fn pairs(&self) -> impl Iterator<Item = (&str, String)> {
        self.0
            .iter()
            .filter_map(|(key, value)| value.render().map(|rendered| (key.as_str(), rendered)))
    }
}

impl From<()> for Query {
    fn from(_: ()) -> Self {
        Self::new()
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Query
where
    K: Into<String>,
    V: Into<Scalar>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Part of a multipart upload body.
///
/// Parts carry owned bytes so the form can be rebuilt for every dispatch
/// attempt while the transport still picks its own boundary header.
#[derive(Clone, Debug, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl FormPart {
    /// Plain text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            mime: None,
            bytes: value.into().into_bytes(),
        }
    }

    /// File field with an explicit MIME type.
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            mime: Some(mime.into()),
            bytes: bytes.into(),
        }
    }
}

/// Request body accepted by the dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// Serialized as text with `Content-Type: application/json`.
    Json(JsonValue),
    /// Passed through untouched; the transport sets the boundary header.
    Multipart(Vec<FormPart>),
}

/// How the `Authorization` header is resolved for a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Auth {
    /// Use the access token currently held by the token store.
    #[default]
    Stored,
    /// Explicit token override for this request.
    Token(String),
    /// Send no `Authorization` header even if a token is stored.
    None,
}

/// Describes one API request.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute URL, or a path resolved against the client's base URL.
    pub endpoint: String,
    pub query: Query,
    pub body: Option<RequestBody>,
    pub auth: Auth,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Query::new(),
            body: None,
            auth: Auth::Stored,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    pub fn with_query(mut self, query: impl Into<Query>) -> Self {
        self.query = query.into();
        self
    }

    /// Serializes `body` as the JSON payload.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let payload = serde_json::to_value(body)
            .map_err(|err| ApiError::Decode(format!("failed to serialize request body: {err}")))?;
        self.body = Some(RequestBody::Json(payload));
        Ok(self)
    }

    pub fn with_multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }

    /// Overrides the stored token for this request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Auth::Token(token.into());
        self
    }

    /// Sends the request without an `Authorization` header.
    pub fn unauthenticated(mut self) -> Self {
        self.auth = Auth::None;
        self
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use crate::{ApiRequest, Auth, Query, Scalar};

    #[test]
    fn query_from_array() {
        let query: Query = [("page", 1), ("size", 10)].into();
        let pairs: Vec<_> = query.pairs().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("page", "1".to_owned()));
        assert_eq!(pairs[1], ("size", "10".to_owned()));
    }

    #[test]
    fn absent_and_empty_values_do_not_render() {
        let query = Query::new()
            .set("page", 1)
            .set("name", None::<String>)
            .set("status", "");
        let pairs: Vec<_> = query.pairs().collect();
        assert_eq!(pairs, vec![("page", "1".to_owned())]);
    }

    #[test]
    fn option_converts_to_absent_or_value() {
        assert_eq!(Scalar::from(None::<i64>), Scalar::Absent);
        assert_eq!(Scalar::from(Some(3i64)), Scalar::Integer(3));
    }

    #[test]
    fn request_constructors() {
        let request = ApiRequest::get("trips");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.auth, Auth::Stored);
        assert!(request.body.is_none());

        let overridden = ApiRequest::delete("trips/1").with_token("tok");
        assert_eq!(overridden.auth, Auth::Token("tok".to_owned()));
        assert_eq!(ApiRequest::post("x").unauthenticated().auth, Auth::None);
    }

    #[test]
    fn with_json_serializes_eagerly() {
        let request = ApiRequest::post("trips")
            .with_json(&serde_json::json!({"name": "Umrah"}))
            .expect("must serialize");
        assert!(request.body.is_some());
    }
}
