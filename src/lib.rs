//! `safar-api` is the async resilient HTTP client shared by the Safar admin
//! dashboard and mobile companion app.
//!
//! Every call runs through the same pipeline:
//! - [`SafarClient`] verb methods resolve the target URL and attach the
//!   access token held by the injected [`TokenStore`]
//! - transient transport failures are retried with bounded linear backoff
//! - responses are normalized into the uniform [`Envelope`]
//! - terminal failures are classified into [`ApiError`] and routed through
//!   the optional [`ErrorHandler`] (toast surface, grace-delayed forced
//!   logout on authentication failure)

mod client;
mod decode;
mod error;
mod handler;
mod options;
mod params;
mod token;
mod types;
mod url;

pub use client::SafarClient;
pub use error::{ApiError, ErrorDetails};
#[cfg(not(target_arch = "wasm32"))]
pub use handler::TokioScheduler;
pub use handler::{
    ErrorHandler, ImmediateScheduler, Notifier, Scheduler, SessionInvalidator, SessionState,
};
pub use options::ClientOptions;
pub use params::{ApiRequest, Auth, FormPart, Query, RequestBody, Scalar};
pub use token::{MemoryStorage, NoStorage, TokenKind, TokenStorage, TokenStore};
pub use types::{Envelope, ErrorField, ErrorPayload, Meta};
pub use url::build_url;

pub type Result<T> = std::result::Result<T, ApiError>;
