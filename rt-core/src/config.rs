//! Application configuration management.
//!
//! Handles loading, saving, and accessing the client configuration: backend
//! project URL and anon key, realtime settings, and logging. Configuration is
//! persisted as TOML on disk and may be overridden from the environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{RtError, RtResult};
use crate::platform;

/// Environment variable overriding `backend.url`.
pub const ENV_URL: &str = "ROOMTHERE_URL";

/// Environment variable overriding `backend.anon_key`.
pub const ENV_ANON_KEY: &str = "ROOMTHERE_ANON_KEY";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend project settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Realtime channel settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL (e.g., "https://abcd.supabase.co").
    #[serde(default)]
    pub url: String,

    /// Public anon key sent as `apikey` on every request.
    #[serde(default)]
    pub anon_key: String,

    /// Custom HTTP headers as key-value pairs.
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,

    /// API request timeout in milliseconds.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_ms: u64,

    /// Database schema exposed through the REST endpoint.
    #[serde(default = "default_schema")]
    pub schema: String,
}

/// Realtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of the change broadcast channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Seconds between heartbeat frames the transport should send.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

// Default value functions for serde

fn default_api_timeout() -> u64 {
    constants::DEFAULT_API_TIMEOUT_MS
}

fn default_schema() -> String {
    constants::DEFAULT_SCHEMA.to_string()
}

fn default_channel_capacity() -> usize {
    constants::DEFAULT_CHANNEL_CAPACITY
}

fn default_heartbeat_interval() -> u64 {
    constants::DEFAULT_HEARTBEAT_INTERVAL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            custom_headers: HashMap::new(),
            api_timeout_ms: default_api_timeout(),
            schema: default_schema(),
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            heartbeat_interval_secs: default_heartbeat_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> RtResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> RtResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file path.
    pub fn save_default(&self) -> RtResult<()> {
        let path = Self::default_config_path()?;
        self.save_to_file(&path)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> RtResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RtError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> RtResult<PathBuf> {
        let config_dir = platform::config_dir()?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> RtResult<PathBuf> {
        if self.logging.directory.is_empty() {
            let data_dir = platform::data_dir()?;
            Ok(data_dir.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Get the file the CLI keeps its auth session in.
    pub fn session_path() -> RtResult<PathBuf> {
        Ok(platform::data_dir()?.join("session.json"))
    }

    /// Replace the project URL and anon key when values are given.
    pub fn apply_overrides(&mut self, url: Option<String>, anon_key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.backend.url = Self::sanitize_project_url(&url);
        }
        if let Some(key) = anon_key.filter(|k| !k.trim().is_empty()) {
            self.backend.anon_key = key.trim().to_string();
        }
    }

    /// Apply `ROOMTHERE_URL` and `ROOMTHERE_ANON_KEY` from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::var(ENV_URL).ok(), std::env::var(ENV_ANON_KEY).ok());
    }

    /// Check whether the backend connection is configured.
    pub fn is_backend_configured(&self) -> bool {
        !self.backend.url.is_empty() && !self.backend.anon_key.is_empty()
    }

    /// Fail with `MissingConfig` unless the backend is configured.
    pub fn require_backend(&self) -> RtResult<&BackendConfig> {
        if self.backend.url.is_empty() {
            return Err(RtError::MissingConfig("backend.url".into()));
        }
        if self.backend.anon_key.is_empty() {
            return Err(RtError::MissingConfig("backend.anon_key".into()));
        }
        Ok(&self.backend)
    }

    /// Sanitize and normalize a project URL.
    ///
    /// Strips surrounding quotes and whitespace, defaults the scheme to
    /// https, and drops trailing slashes.
    pub fn sanitize_project_url(url: &str) -> String {
        let trimmed = url.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        with_scheme.trim_end_matches('/').to_string()
    }
}

/// Thread-safe configuration holder for shared access.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Save the current configuration to disk.
    pub async fn save(&self) -> RtResult<()> {
        let config = self.inner.read().await;
        config.save_default()
    }
}
