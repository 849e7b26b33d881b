//! Client configuration resolved from the environment.
//!
//! The backend base URL is read once per process: `ClientConfig::global()`
//! caches the first `from_env()` result and every later caller sees the same
//! value, even if the environment changes afterwards.

use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::error::{ApiError, Result};

pub const BACKEND_URL_VAR: &str = "FARM_ASSIST_BACKEND_URL";
pub const TIMEOUT_VAR: &str = "FARM_ASSIST_TIMEOUT_SECS";
pub const MAX_IMAGE_BYTES_VAR: &str = "FARM_ASSIST_MAX_IMAGE_BYTES";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

static GLOBAL: OnceCell<ClientConfig> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin without a trailing slash, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Upper bound for one request/response exchange.
    pub request_timeout: Duration,
    /// Largest decoded image the request builder will send.
    pub max_image_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_image_bytes(mut self, limit: usize) -> Self {
        self.max_image_bytes = limit;
        self
    }

    /// Load `.env` if present, then read the `FARM_ASSIST_*` variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset or blank keys fall
    /// back to defaults; unparsable numbers are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = match get(BACKEND_URL_VAR) {
            Some(url) => Self::new(url.trim()),
            None => Self::default(),
        };

        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::Config(format!("{TIMEOUT_VAR} must be whole seconds, got {raw:?}"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = get(MAX_IMAGE_BYTES_VAR) {
            config.max_image_bytes = raw.trim().parse().map_err(|_| {
                ApiError::Config(format!(
                    "{MAX_IMAGE_BYTES_VAR} must be a byte count, got {raw:?}"
                ))
            })?;
        }

        Ok(config)
    }

    /// The process-wide configuration, resolved from the environment on first
    /// use and never re-resolved.
    pub fn global() -> Result<&'static ClientConfig> {
        GLOBAL.get_or_try_init(|| {
            let config = Self::from_env()?;
            tracing::debug!(base_url = %config.base_url, "resolved backend configuration");
            Ok(config)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, "http://localhost");
    }

    #[test]
    fn reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            (BACKEND_URL_VAR, "https://farm.example.com/"),
            (TIMEOUT_VAR, "5"),
            (MAX_IMAGE_BYTES_VAR, "1024"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://farm.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_image_bytes, 1024);
    }

    #[test]
    fn blank_url_falls_back_to_default() {
        let config = ClientConfig::from_lookup(lookup(&[(BACKEND_URL_VAR, "  ")])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn bad_timeout_is_a_config_error() {
        let err = ClientConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn global_is_resolved_once() {
        std::env::set_var(BACKEND_URL_VAR, "http://first.example/");
        let first = ClientConfig::global().unwrap();
        std::env::set_var(BACKEND_URL_VAR, "http://second.example");
        let second = ClientConfig::global().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(second.base_url, "http://first.example");
    }
}
