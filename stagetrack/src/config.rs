//! Configuration types for the tracker and the upload collaborator.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding [`UploadConfig::endpoint`].
pub const ENV_ENDPOINT: &str = "STAGETRACK_ENDPOINT";
/// Environment variable overriding [`TrackerConfig::step_interval_ms`].
pub const ENV_STEP_INTERVAL_MS: &str = "STAGETRACK_STEP_INTERVAL_MS";

/// Timing of the simulated timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Offset of the first step from the trigger, in milliseconds.
    #[serde(default)]
    pub initial_delay_ms: u64,
    /// Gap between consecutive steps, in milliseconds.
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,
}

fn default_step_interval_ms() -> u64 {
    1000
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 0,
            step_interval_ms: default_step_interval_ms(),
        }
    }
}

impl TrackerConfig {
    /// Creates a tracker configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the step interval.
    #[must_use]
    pub fn with_step_interval_ms(mut self, ms: u64) -> Self {
        self.step_interval_ms = ms;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay_ms(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    /// Gets the step interval as a Duration.
    #[must_use]
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    /// Gets the initial delay as a Duration.
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

/// Settings for submitting documents to the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Full URL of the extraction endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Accepted file extensions, lowercase with leading dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Largest accepted file, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8000/extract".to_string()
}

fn default_allowed_extensions() -> Vec<String> {
    [".pdf", ".jpg", ".jpeg", ".png", ".bmp", ".tiff"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_timeout() -> f64 {
    120.0
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            allowed_extensions: default_allowed_extensions(),
            max_file_size_bytes: default_max_file_size(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl UploadConfig {
    /// Creates an upload configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }

    /// Returns true if `extension` (with leading dot, any case) is accepted.
    #[must_use]
    pub fn allows_extension(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|e| *e == extension)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Timeline settings.
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Upload settings.
    #[serde(default)]
    pub upload: UploadConfig,
}

impl AppConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is invalid.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_json_str(&raw)
    }

    /// Applies `STAGETRACK_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an override cannot be parsed.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if an override cannot be parsed.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.upload.endpoint = endpoint;
        }
        if let Some(raw) = lookup(ENV_STEP_INTERVAL_MS) {
            self.tracker.step_interval_ms = raw.trim().parse().map_err(|_| {
                ConfigError::invalid(ENV_STEP_INTERVAL_MS, format!("'{raw}' is not an integer"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("upload.endpoint", "cannot be empty"));
        }
        if self.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::invalid(
                "upload.allowed_extensions",
                "at least one extension is required",
            ));
        }
        if let Some(bad) = self
            .upload
            .allowed_extensions
            .iter()
            .find(|e| !e.starts_with('.'))
        {
            return Err(ConfigError::invalid(
                "upload.allowed_extensions",
                format!("'{bad}' must start with a dot"),
            ));
        }
        if !(self.upload.timeout_seconds.is_finite() && self.upload.timeout_seconds > 0.0) {
            return Err(ConfigError::invalid("upload.timeout_seconds", "must be positive"));
        }
        Ok(())
    }
}
