use std::collections::BTreeMap;

/// Structured payload carried by classified HTTP errors.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorDetails {
    /// HTTP status code that produced the classification.
    pub status: u16,
    /// Message from the backend, or the canonical status reason when the
    /// backend sent none.
    pub message: String,
    /// Field-level validation errors, keyed by field name.
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    /// Machine-readable error code from the backend.
    pub code: Option<String>,
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network or request execution error from `reqwest`. No response was
    /// received, so the attempt is eligible for retry.
    #[error("network error: {0}")]
    Network(reqwest::Error),
    /// The attempt exceeded its deadline. Retried like a network failure;
    /// reported as status 408 once retries exhaust.
    #[error("request timed out")]
    Timeout,
    /// The request URL could not be built.
    #[error("invalid request url: {0}")]
    Url(String),
    /// 401. The session is no longer authenticated; triggers forced logout
    /// through the registered handler.
    #[error("authentication error: {}", .0.message)]
    Authentication(ErrorDetails),
    /// 403. Authenticated but not allowed.
    #[error("authorization error: {}", .0.message)]
    Authorization(ErrorDetails),
    /// 404.
    #[error("not found: {}", .0.message)]
    NotFound(ErrorDetails),
    /// Remaining non-success statuses below 500. May carry field-level
    /// validation errors.
    #[error("validation error: {}", .0.message)]
    Validation(ErrorDetails),
    /// 5xx.
    #[error("server error: {}", .0.message)]
    Server(ErrorDetails),
    /// Payload encoding or response-shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classifies a non-success HTTP outcome into the error taxonomy.
    pub(crate) fn from_details(details: ErrorDetails) -> Self {
        match details.status {
            401 => Self::Authentication(details),
            403 => Self::Authorization(details),
            404 => Self::NotFound(details),
            status if status >= 500 => Self::Server(details),
            _ => Self::Validation(details),
        }
    }

    /// HTTP status associated with the error, if any. Timeouts report 408.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Timeout => Some(408),
            Self::Authentication(details)
            | Self::Authorization(details)
            | Self::NotFound(details)
            | Self::Validation(details)
            | Self::Server(details) => Some(details.status),
            Self::Network(_) | Self::Url(_) | Self::Decode(_) => None,
        }
    }

    /// Structured details for classified HTTP errors.
    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            Self::Authentication(details)
            | Self::Authorization(details)
            | Self::NotFound(details)
            | Self::Validation(details)
            | Self::Server(details) => Some(details),
            _ => None,
        }
    }

    /// Whether the failure is transport-level and eligible for bounded retry.
    ///
    /// Classified HTTP responses are terminal: any status, success or
    /// failure, completes on the attempt that received it.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Network(error) => is_retryable_transport(error),
            _ => false,
        }
    }
}

fn is_retryable_transport(error: &reqwest::Error) -> bool {
    error.is_timeout()
        || error.is_request()
        || error.is_body()
        // is_connect() is not available on wasm32 targets (no TCP)
        || {
            #[cfg(not(target_arch = "wasm32"))]
            { error.is_connect() }
            #[cfg(target_arch = "wasm32")]
            { false }
        }
}
