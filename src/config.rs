//! Client configuration from environment variables.
//!
//! Load configuration using `ClientConfig::from_env()` after calling
//! `dotenvy::dotenv()`.

use std::time::Duration;

use tracing::warn;

use crate::connection::DEFAULT_ENDPOINT;
use crate::error::ConfigError;
use crate::session::Settings;
use crate::types::QualityTier;

/// Everything needed to start a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Relay WebSocket URL, without the channel query
    pub endpoint: String,
    /// API key sent as the sub-protocol token
    pub credential: String,
    /// Initial runtime settings
    pub settings: Settings,
    /// Evict remote cursors not heard from for this long; `None` keeps them
    pub stale_after: Option<Duration>,
}

impl ClientConfig {
    /// Creates a config for the default endpoint with default settings
    pub fn new(credential: impl Into<String>) -> Self {
        ClientConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credential: credential.into(),
            settings: Settings::default(),
            stale_after: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }

    /// Loads configuration from `COCURSOR_*` environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// * `COCURSOR_URL` - relay endpoint (default `ws://127.0.0.1:8080`)
    /// * `COCURSOR_API_KEY` - credential, required
    /// * `COCURSOR_CHANNEL`, `COCURSOR_NAME` - optional
    /// * `COCURSOR_QUALITY` - `high`, `middle` or `low`; anything else is `high`
    /// * `COCURSOR_SHARING`, `COCURSOR_DISABLED`, `COCURSOR_SHOW_LOCAL_CURSOR` - booleans
    /// * `COCURSOR_STALE_AFTER_MS` - idle eviction window in milliseconds
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let credential = lookup("COCURSOR_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("COCURSOR_API_KEY"))?;

        let defaults = Settings::default();
        let quality = match lookup("COCURSOR_QUALITY") {
            Some(raw) => {
                let quality = QualityTier::parse_lenient(&raw);
                if quality.as_str() != raw.trim().to_ascii_lowercase() {
                    warn!(value = %raw, "unknown quality tier, broadcasting unthrottled");
                }
                quality
            }
            None => defaults.quality,
        };

        let settings = Settings {
            channel: lookup("COCURSOR_CHANNEL").filter(|c| !c.is_empty()),
            name: lookup("COCURSOR_NAME").filter(|n| !n.is_empty()),
            sharing: parse_bool(&lookup, "COCURSOR_SHARING", defaults.sharing)?,
            quality,
            disabled: parse_bool(&lookup, "COCURSOR_DISABLED", defaults.disabled)?,
            show_local_cursor: parse_bool(
                &lookup,
                "COCURSOR_SHOW_LOCAL_CURSOR",
                defaults.show_local_cursor,
            )?,
        };

        let stale_after = match lookup("COCURSOR_STALE_AFTER_MS") {
            Some(raw) => {
                let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "COCURSOR_STALE_AFTER_MS",
                    value: raw.clone(),
                })?;
                (millis > 0).then(|| Duration::from_millis(millis))
            }
            None => None,
        };

        Ok(ClientConfig {
            endpoint: lookup("COCURSOR_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            credential,
            settings,
            stale_after,
        })
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
