use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Token kinds held by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived bearer credential attached to API requests.
    Access,
    /// Long-lived credential used to mint new access tokens.
    Refresh,
}

fn storage_key(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Access => "safar_access_token",
        TokenKind::Refresh => "safar_refresh_token",
    }
}

/// Platform storage backend consumed by [`TokenStore`].
///
/// Implementations wrap whatever the platform offers (secure storage on
/// mobile, browser storage on web) and are selected at composition time.
pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn delete(&self, key: &str);
}

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_owned(), value.to_owned());
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// Storage backend for execution contexts with no ambient storage, such as
/// server-side rendering. Every read returns `None`; callers must pass an
/// explicit token.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoStorage;

impl TokenStorage for NoStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn delete(&self, _key: &str) {}
}

/// Two-tier token store: a durable tier for "remembered" sessions and an
/// ephemeral tier for session-only logins.
///
/// For a given token kind at most one tier holds a value at any time;
/// writing one tier clears the other. Construct one store per application
/// context and share it by reference. Concurrent writers are not
/// synchronized beyond the backends' own interior mutability (last write
/// wins).
pub struct TokenStore {
    durable: Arc<dyn TokenStorage>,
    ephemeral: Arc<dyn TokenStorage>,
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    pub fn new(durable: Arc<dyn TokenStorage>, ephemeral: Arc<dyn TokenStorage>) -> Self {
        Self { durable, ephemeral }
    }

    /// Both tiers in memory. Suits tests and native contexts without
    /// platform storage wired up yet.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    /// No ambient storage at all; every read returns `None`.
    pub fn detached() -> Self {
        Self::new(Arc::new(NoStorage), Arc::new(NoStorage))
    }

    /// Stores a token, choosing the durable tier when `remember` is set.
    /// The other tier is cleared for that kind.
    pub fn set_token(&self, kind: TokenKind, value: &str, remember: bool) {
        let key = storage_key(kind);
        if remember {
            self.durable.set(key, value);
            self.ephemeral.delete(key);
        } else {
            self.ephemeral.set(key, value);
            self.durable.delete(key);
        }
    }

    /// Reads a token, durable tier first, falling back to the ephemeral
    /// tier. Each kind resolves independently.
    pub fn token(&self, kind: TokenKind) -> Option<String> {
        let key = storage_key(kind);
        self.durable.get(key).or_else(|| self.ephemeral.get(key))
    }

    /// Removes both kinds from both tiers.
    pub fn clear_all(&self) {
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let key = storage_key(kind);
            self.durable.delete(key);
            self.ephemeral.delete(key);
        }
    }
}
