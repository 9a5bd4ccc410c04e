//! # Client Configuration
//!
//! Where the backend lives and how the store behaves.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CAJA_API_URL=https://pos.example.pe/api                            │
//! │     CAJA_API_TOKEN=eyJhbGciOi...                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/caja/caja.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.caja.pos/caja.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:3000/api, 30s timeout, 5s error display           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # caja.toml
//! [api]
//! base_url = "https://pos.example.pe/api"
//! token = "eyJhbGciOi..."
//! request_timeout_secs = 30
//! utc_offset = "-05:00"
//!
//! [store]
//! error_clear_secs = 5
//! history_page_size = 10
//! ```

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use caja_core::{DEFAULT_PAGE_SIZE, ERROR_CLEAR_SECS, MAX_PAGE_SIZE};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// How to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; endpoint paths (`/caja/estado`…) are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent in `Authorization`, if the backend requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Offset of backend timestamps that carry none (`"-05:00"`). Unset
    /// means UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            token: None,
            request_timeout_secs: default_request_timeout(),
            utc_offset: None,
        }
    }
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parsed [`utc_offset`](Self::utc_offset), UTC when unset.
    pub fn naive_offset(&self) -> ClientResult<FixedOffset> {
        match self.utc_offset.as_deref() {
            None => Ok(Utc.fix()),
            Some(text) => text.trim().parse::<FixedOffset>().map_err(|_| {
                ClientError::InvalidConfig(format!(
                    "utc_offset must look like -05:00, got '{}'",
                    text
                ))
            }),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Behaviour of the shift store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Seconds an error message stays before clearing itself.
    ///
    /// Operators always see 5 seconds; the knob exists so tests and kiosk
    /// deployments can shorten or stretch it.
    #[serde(default = "default_error_clear")]
    pub error_clear_secs: u64,

    /// History rows per page.
    #[serde(default = "default_page_size")]
    pub history_page_size: u32,
}

fn default_error_clear() -> u64 {
    ERROR_CLEAR_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            error_clear_secs: default_error_clear(),
            history_page_size: default_page_size(),
        }
    }
}

impl StoreSettings {
    pub fn error_clear_after(&self) -> Duration {
        Duration::from_secs(self.error_clear_secs)
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (caja.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file as pretty TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        self.base_url()?;
        self.api.naive_offset()?;

        if self.api.request_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.store.error_clear_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "error_clear_secs must be greater than 0".into(),
            ));
        }

        if self.store.history_page_size == 0 || self.store.history_page_size > MAX_PAGE_SIZE {
            return Err(ClientError::InvalidConfig(format!(
                "history_page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(())
    }

    /// Parsed base URL. Only http and https are accepted.
    pub fn base_url(&self) -> ClientResult<Url> {
        let url = Url::parse(&self.api.base_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got scheme '{}'",
                other
            ))),
        }
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CAJA_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(token) = lookup("CAJA_API_TOKEN") {
            debug!("Overriding API token from environment");
            self.api.token = Some(token).filter(|t| !t.is_empty());
        }

        if let Some(secs) = lookup("CAJA_REQUEST_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.request_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric CAJA_REQUEST_TIMEOUT_SECS"),
            }
        }

        if let Some(offset) = lookup("CAJA_UTC_OFFSET") {
            debug!(offset = %offset, "Overriding backend UTC offset from environment");
            self.api.utc_offset = Some(offset).filter(|o| !o.is_empty());
        }

        if let Some(secs) = lookup("CAJA_ERROR_CLEAR_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.store.error_clear_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric CAJA_ERROR_CLEAR_SECS"),
            }
        }

        if let Some(size) = lookup("CAJA_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(s) => self.store.history_page_size = s,
                Err(_) => warn!(value = %size, "Ignoring non-numeric CAJA_PAGE_SIZE"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "caja", "pos")
            .map(|dirs| dirs.config_dir().join("caja.toml"))
    }
}
