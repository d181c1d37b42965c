use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{error::ApiError, token::TokenStore};

/// Toast/notification surface invoked for terminal errors.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Application hook invoked when a forced logout executes (clear navigation
/// state, redirect to the login screen).
pub trait SessionInvalidator: Send + Sync {
    fn invalidate_session(&self);
}

/// Delay source for the logout grace period.
///
/// Injected so tests can drive virtual time instead of sleeping on the wall
/// clock.
pub trait Scheduler: Send + Sync {
    fn delay(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
}

/// Scheduler backed by `tokio::time::sleep`. Respects `tokio::time::pause`
/// in tests.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

#[cfg(not(target_arch = "wasm32"))]
impl Scheduler for TokioScheduler {
    fn delay(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Scheduler that completes immediately.
///
/// The default on WASM targets, where no timer integration is assumed: the
/// forced logout runs as soon as the notification has been dispatched.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn delay(&self, _duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        Box::pin(std::future::ready(()))
    }
}

/// Authentication-failure progression.
///
/// `Detected` and `Notified` happen synchronously inside
/// [`ErrorHandler::handle`]; the transition to `Invalidated` is delayed by
/// the grace period so the notification can render before the session is
/// torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Detected,
    Notified,
    Invalidated,
}

/// Global error handler: turns terminal errors into user-facing side
/// effects and drives the forced-logout state machine on authentication
/// failures.
pub struct ErrorHandler {
    notifier: Arc<dyn Notifier>,
    invalidator: Arc<dyn SessionInvalidator>,
    scheduler: Arc<dyn Scheduler>,
    grace_delay: Duration,
    tokens: Option<Arc<TokenStore>>,
    session: Arc<Mutex<SessionState>>,
}

impl ErrorHandler {
    pub fn new(notifier: Arc<dyn Notifier>, invalidator: Arc<dyn SessionInvalidator>) -> Self {
        Self {
            notifier,
            invalidator,
            scheduler: default_scheduler(),
            grace_delay: Duration::from_millis(2_000),
            tokens: None,
            session: Arc::new(Mutex::new(SessionState::Active)),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Overrides the pause between the notification and the forced logout.
    pub fn with_grace_delay(mut self, grace_delay: Duration) -> Self {
        self.grace_delay = grace_delay;
        self
    }

    /// Attaches the token store whose tokens are destroyed on forced logout.
    pub fn with_token_store(mut self, tokens: Arc<TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Current position in the forced-logout progression.
    pub fn session_state(&self) -> SessionState {
        self.session
            .lock()
            .map(|state| *state)
            .unwrap_or(SessionState::Active)
    }

    /// Applies the user-facing side effects for a terminal error.
    ///
    /// Every terminal error produces a notification, except credential
    /// failures, which the calling form renders inline. A 401 additionally
    /// arms the grace-delayed forced logout.
    pub fn handle(&self, error: &ApiError) {
        match error {
            ApiError::Authentication(details) => self.on_authentication_failure(&details.message),
            ApiError::Validation(details) => {
                if !is_credential_failure(&details.message) {
                    self.notifier.notify(&details.message);
                }
            }
            ApiError::Authorization(details)
            | ApiError::NotFound(details)
            | ApiError::Server(details) => self.notifier.notify(&details.message),
            other => self.notifier.notify(&other.to_string()),
        }
    }

    fn on_authentication_failure(&self, message: &str) {
        {
            let Ok(mut state) = self.session.lock() else {
                return;
            };
            if *state != SessionState::Active {
                // An invalidation is already pending or completed.
                return;
            }
            *state = SessionState::Detected;
        }

        self.notifier.notify(message);
        if let Ok(mut state) = self.session.lock() {
            *state = SessionState::Notified;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("session invalidation armed after grace delay");

        let session = Arc::clone(&self.session);
        let invalidator = Arc::clone(&self.invalidator);
        let tokens = self.tokens.clone();
        let delay = self.scheduler.delay(self.grace_delay);
        spawn_invalidation(async move {
            delay.await;
            if let Some(tokens) = tokens {
                tokens.clear_all();
            }
            if let Ok(mut state) = session.lock() {
                *state = SessionState::Invalidated;
            }
            invalidator.invalidate_session();
        });
    }
}

/// Credential failures are rendered inline by the login/password forms, so
/// the ambient toast is suppressed for them.
fn is_credential_failure(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    lowered.contains("password") || lowered.contains("credential")
}

fn default_scheduler() -> Arc<dyn Scheduler> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        Arc::new(TokioScheduler)
    }
    #[cfg(target_arch = "wasm32")]
    {
        Arc::new(ImmediateScheduler)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_invalidation(task: impl Future<Output = ()> + Send + 'static) {
    tokio::spawn(task);
}

// Browser event loop; spawned futures need not be Send there.
#[cfg(target_arch = "wasm32")]
fn spawn_invalidation(task: impl Future<Output = ()> + 'static) {
    wasm_bindgen_futures::spawn_local(task);
}
