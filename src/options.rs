/// Configures HTTP timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds. Each retry gets a fresh window.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base inter-attempt delay in milliseconds. The wait before attempt `n`
    /// is `retry_delay_ms * n` (linear, non-decreasing).
    pub retry_delay_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ClientOptions {
    /// Reads overrides from the environment.
    ///
    /// - `SAFAR_API_TIMEOUT_MS` — per-attempt timeout
    /// - `SAFAR_API_MAX_RETRIES` — retries after the initial attempt
    /// - `SAFAR_API_RETRY_DELAY_MS` — base inter-attempt delay
    ///
    /// Missing or empty variables keep their defaults; unparseable values
    /// are an error.
    ///
    /// **Not available on `wasm32` targets** — environment variables do not
    /// exist in browser runtimes.
    pub fn from_env() -> Result<Self, String> {
        let mut options = Self::default();
        if let Some(value) = read_env("SAFAR_API_TIMEOUT_MS")? {
            options.timeout_ms = value;
        }
        if let Some(value) = read_env("SAFAR_API_MAX_RETRIES")? {
            options.max_retries = value;
        }
        if let Some(value) = read_env("SAFAR_API_RETRY_DELAY_MS")? {
            options.retry_delay_ms = value;
        }
        Ok(options)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn read_env<T>(name: &str) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| format!("invalid {name} value '{raw}': {err}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::ClientOptions;

    #[test]
    fn defaults_match_documented_values() {
        let options = ClientOptions::default();
        assert_eq!(options.timeout_ms, 30_000);
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.retry_delay_ms, 1_000);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn from_env_rejects_unparseable_values() {
        std::env::set_var("SAFAR_API_MAX_RETRIES", "lots");
        let err = ClientOptions::from_env().expect_err("must fail");
        assert!(err.contains("SAFAR_API_MAX_RETRIES"));
        std::env::remove_var("SAFAR_API_MAX_RETRIES");
    }
}
