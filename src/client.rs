use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, multipart};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;

// tokio::time::sleep is only available on non-WASM targets.
#[cfg(not(target_arch = "wasm32"))]
use tokio::time::sleep;

use crate::{
    decode,
    handler::ErrorHandler,
    params::{ApiRequest, Auth, FormPart, Query, RequestBody},
    token::{TokenKind, TokenStore},
    url::build_url,
    ApiError, ClientOptions, Envelope, Result,
};

/// HTTP client for the Safar platform REST API.
///
/// One instance is shared per application context. Every call resolves its
/// URL against the configured base, attaches the stored access token,
/// retries transient transport failures with linear backoff, and normalizes
/// the response into [`Envelope`].
#[derive(Clone)]
pub struct SafarClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    handler: Option<Arc<ErrorHandler>>,
    options: ClientOptions,
}

impl fmt::Debug for SafarClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafarClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SafarClient {
    /// Creates a client for the given base URL.
    ///
    /// The token store is an explicit capability: construct it once per
    /// application context and share it by reference.
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            tokens,
            handler: None,
            options: ClientOptions::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `SAFAR_API_URL` — base URL of the REST API
    /// - `SAFAR_API_TIMEOUT_MS`, `SAFAR_API_MAX_RETRIES`,
    ///   `SAFAR_API_RETRY_DELAY_MS` — optional overrides, see
    ///   [`ClientOptions::from_env`]
    ///
    /// Returns an error if the base URL is missing or empty.
    ///
    /// **Not available on `wasm32` targets** — environment variables do not
    /// exist in browser runtimes. Use [`SafarClient::new`] with configuration
    /// received from the host page.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env(tokens: Arc<TokenStore>) -> std::result::Result<Self, String> {
        let base_url = std::env::var("SAFAR_API_URL")
            .map_err(|_| "missing SAFAR_API_URL environment variable".to_owned())?;
        if base_url.trim().is_empty() {
            return Err("SAFAR_API_URL is set but empty".to_owned());
        }
        let options = ClientOptions::from_env()?;
        Ok(Self::new(base_url.trim().to_owned(), tokens).with_options(options))
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers the global error handler run for every terminal error.
    pub fn with_error_handler(mut self, handler: Arc<ErrorHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Token store shared with this client.
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Fetches `endpoint`, resolving query parameters into the URL.
    pub async fn get<T, Q>(&self, endpoint: &str, query: Q) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
        Q: Into<Query>,
    {
        self.send(ApiRequest::get(endpoint).with_query(query)).await
    }

    /// Creates a resource from a JSON body.
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::post(endpoint).with_json(body)?).await
    }

    /// Replaces a resource with a JSON body.
    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::put(endpoint).with_json(body)?).await
    }

    /// Partially updates a resource with a JSON body.
    pub async fn patch<T, B>(&self, endpoint: &str, body: &B) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::patch(endpoint).with_json(body)?).await
    }

    /// Deletes a resource.
    pub async fn delete<T>(&self, endpoint: &str) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        self.send(ApiRequest::delete(endpoint)).await
    }

    /// Uploads a multipart form.
    ///
    /// The body is passed through untouched so the transport can set its own
    /// boundary header.
    pub async fn upload<T>(&self, endpoint: &str, parts: Vec<FormPart>) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(endpoint).with_multipart(parts))
            .await
    }

    /// Dispatches a fully described request.
    ///
    /// Transient transport failures are retried transparently and never
    /// reach the caller unless retries are exhausted. Terminal errors run
    /// through the registered error handler (when any) and are then returned
    /// for the caller's own contextual reporting.
    pub async fn send<T>(&self, request: ApiRequest) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        let outcome = self
            .dispatch_with_retry(&request)
            .await
            .and_then(decode::into_typed);

        match outcome {
            Ok(envelope) => Ok(envelope),
            Err(error) => {
                if let Some(handler) = &self.handler {
                    handler.handle(&error);
                }
                Err(error)
            }
        }
    }

    async fn dispatch_with_retry(&self, request: &ApiRequest) -> Result<Envelope<JsonValue>> {
        let url = build_url(&self.base_url, &request.endpoint, &request.query)?;
        let authorization = self.resolve_authorization(&request.auth);

        let mut attempt = 0usize;
        loop {
            match self.dispatch_once(request, &url, authorization.as_deref()).await {
                // A classified HTTP response, any status, is never retried.
                Ok(response) => return self.normalize(response).await,
                Err(error) if error.is_retryable() && attempt < self.options.max_retries => {
                    self.wait_before_retry(attempt).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Resolves the `Authorization` header value for a request.
    ///
    /// Defaults to the stored access token; an explicit override or an
    /// explicit opt-out both bypass the store.
    fn resolve_authorization(&self, auth: &Auth) -> Option<String> {
        match auth {
            Auth::Stored => self
                .tokens
                .token(TokenKind::Access)
                .map(|token| normalize_bearer_authorization(&token)),
            Auth::Token(token) => Some(normalize_bearer_authorization(token)),
            Auth::None => None,
        }
    }

    /// Performs one HTTP attempt under its own timeout window.
    async fn dispatch_once(
        &self,
        request: &ApiRequest,
        url: &str,
        authorization: Option<&str>,
    ) -> Result<reqwest::Response> {
        // GET responses must never be served from an intermediary cache.
        // On WASM, reqwest drives the timeout through AbortController; the
        // `.timeout()` method is available on both targets.
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(header::PRAGMA, "no-cache")
            .header(header::EXPIRES, "0")
            .timeout(Duration::from_millis(self.options.timeout_ms));

        if let Some(authorization) = authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }

        builder = match &request.body {
            Some(RequestBody::Json(payload)) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .json(payload),
            // Multipart keeps its transport-chosen Content-Type and boundary;
            // the form is rebuilt from the owned parts for every attempt.
            Some(RequestBody::Multipart(parts)) => builder.multipart(build_form(parts)?),
            None => builder,
        };

        builder.send().await.map_err(map_transport_error)
    }

    async fn normalize(&self, response: reqwest::Response) -> Result<Envelope<JsonValue>> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            let details = decode::normalize_error(status.as_u16(), &body);
            return Err(ApiError::from_details(details));
        }

        decode::normalize_success(content_type.as_deref(), &body)
    }

    /// Waits before the next retry attempt.
    ///
    /// The delay grows linearly: `retry_delay_ms × (attempt + 1)`.
    /// On native targets the wait uses `tokio::time::sleep`. On WASM targets
    /// it is a no-op — `tokio::time::sleep` is not available and browser
    /// contexts prefer fast failure over sleeping.
    async fn wait_before_retry(&self, attempt: usize) {
        let multiplier = attempt as u64 + 1;
        let delay_ms = self.options.retry_delay_ms.saturating_mul(multiplier);

        #[cfg(feature = "tracing")]
        tracing::debug!("retrying request after {} ms", delay_ms);

        #[cfg(not(target_arch = "wasm32"))]
        sleep(Duration::from_millis(delay_ms)).await;

        // WASM: no sleep implementation — suppress unused variable warning.
        #[cfg(target_arch = "wasm32")]
        let _ = delay_ms;
    }
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(error)
    }
}

fn build_form(parts: &[FormPart]) -> Result<multipart::Form> {
    let mut form = multipart::Form::new();
    for part in parts {
        let mut piece = multipart::Part::bytes(part.bytes.clone());
        if let Some(file_name) = &part.file_name {
            piece = piece.file_name(file_name.clone());
        }
        if let Some(mime) = &part.mime {
            piece = piece.mime_str(mime).map_err(|err| {
                ApiError::Decode(format!(
                    "invalid mime type '{mime}' for part '{}': {err}",
                    part.name
                ))
            })?;
        }
        form = form.part(part.name.clone(), piece);
    }
    Ok(form)
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{normalize_bearer_authorization, SafarClient};
    use crate::{Auth, TokenKind, TokenStore};

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(
            normalize_bearer_authorization("abc123"),
            "Bearer abc123".to_owned()
        );
    }

    #[test]
    fn normalize_bearer_keeps_existing_prefix() {
        assert_eq!(
            normalize_bearer_authorization("bEaReR abc123"),
            "bEaReR abc123".to_owned()
        );
    }

    #[test]
    fn authorization_resolution_honors_overrides() {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens.set_token(TokenKind::Access, "stored", true);
        let client = SafarClient::new("https://api.safar.example", tokens);

        assert_eq!(
            client.resolve_authorization(&Auth::Stored).as_deref(),
            Some("Bearer stored")
        );
        assert_eq!(
            client
                .resolve_authorization(&Auth::Token("explicit".to_owned()))
                .as_deref(),
            Some("Bearer explicit")
        );
        assert!(client.resolve_authorization(&Auth::None).is_none());
    }

    #[test]
    fn missing_stored_token_sends_no_header() {
        let client = SafarClient::new("https://api.safar.example", Arc::new(TokenStore::detached()));
        assert!(client.resolve_authorization(&Auth::Stored).is_none());
    }

    #[test]
    fn debug_exposes_no_secret_material() {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens.set_token(TokenKind::Access, "secret-token", true);
        let client = SafarClient::new("https://api.safar.example", tokens);
        let debug = format!("{client:?}");
        assert!(debug.contains("base_url"));
        assert!(!debug.contains("secret-token"));
    }
}
