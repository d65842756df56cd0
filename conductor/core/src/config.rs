//! Configuration
//!
//! Centralized configuration loading for the session engine, with an optional
//! TOML file at `~/.config/sudosolve/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [session]
//! manual_solve = true
//! clear_resets_session = true
//! welcome_on_reset = true
//!
//! [progress]
//! tick_interval_ms = 500
//! increment = 10
//! cap = 90
//! reset_delay_ms = 1000
//!
//! [backend]
//! url = "http://localhost:3000"
//! timeout_secs = 120
//!
//! [limits]
//! max_input_length = 1024
//! max_upload_bytes = 10485760
//!
//! [download]
//! dir = "~/Downloads"
//! filename = "solved-sudoku.png"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendConfig;
use crate::progress::ProgressConfig;

/// Default name for saved images
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "solved-sudoku.png";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[session]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Require an explicit `solve` after upload
    pub manual_solve: Option<bool>,
    /// `clear` also resets the session
    pub clear_resets_session: Option<bool>,
    /// A cleared log starts with the welcome line
    pub welcome_on_reset: Option<bool>,
}

/// `[progress]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressToml {
    /// Milliseconds between increments
    pub tick_interval_ms: Option<u64>,
    /// Percentage points per tick
    pub increment: Option<u8>,
    /// Highest value while pending
    pub cap: Option<u8>,
    /// Milliseconds 100 stays visible
    pub reset_delay_ms: Option<u64>,
}

/// `[backend]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Solver base URL
    pub url: Option<String>,
    /// Solve request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// `[limits]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsToml {
    /// Longest accepted input line, in characters
    pub max_input_length: Option<usize>,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: Option<usize>,
}

/// `[download]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadToml {
    /// Directory solved images are saved to
    pub dir: Option<String>,
    /// File name for saved images
    pub filename: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorToml {
    /// Session behavior
    pub session: SessionToml,
    /// Progress estimation
    pub progress: ProgressToml,
    /// Solver connection
    pub backend: BackendToml,
    /// Input limits
    pub limits: LimitsToml,
    /// Saving solved images
    pub download: DownloadToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Configuration for the Conductor
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Require an explicit `solve` after upload
    pub manual_solve: bool,

    /// `clear` also resets the session
    pub clear_resets_session: bool,

    /// A cleared log starts with the welcome line
    pub welcome_on_reset: bool,

    /// Progress estimator tuning
    pub progress: ProgressConfig,

    /// Solver connection
    pub backend: BackendConfig,

    /// Longest accepted input line, in characters
    pub max_input_length: usize,

    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,

    /// Directory solved images are saved to
    pub download_dir: PathBuf,

    /// File name for saved images
    pub download_filename: String,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Highest-precedence layer that set a value
    pub source: ConfigSource,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            manual_solve: true,
            clear_resets_session: true,
            welcome_on_reset: true,
            progress: ProgressConfig::default(),
            backend: BackendConfig::default(),
            max_input_length: 1024,
            max_upload_bytes: 10 * 1024 * 1024,
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            download_filename: DEFAULT_DOWNLOAD_FILENAME.to_string(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ConductorConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check values that would break the engine
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.progress.increment == 0 {
            return Err(ConfigError::ValidationError(
                "progress.increment must be greater than 0".to_string(),
            ));
        }
        if self.progress.cap >= 100 {
            return Err(ConfigError::ValidationError(format!(
                "progress.cap must be below 100, got {}",
                self.progress.cap
            )));
        }
        if self.progress.tick_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "progress.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.download_filename.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "download.filename must not be empty".to_string(),
            ));
        }
        if self.backend.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/sudosolve/config.toml` or
/// `~/.config/sudosolve/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sudosolve").join("config.toml"))
}

/// Load configuration from the default path, the environment and defaults
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the result fails validation. A missing file is not an error.
pub fn load_config() -> Result<ConductorConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the result fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ConductorConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration using `env` to look up environment variables
///
/// # Errors
///
/// See [`load_config_from_path`].
pub fn load_config_with_env<F>(
    path: Option<PathBuf>,
    env: F,
) -> Result<ConductorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ConductorConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ConductorToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ConductorConfig, toml: &ConductorToml) {
    // Session
    if let Some(manual) = toml.session.manual_solve {
        config.manual_solve = manual;
    }
    if let Some(resets) = toml.session.clear_resets_session {
        config.clear_resets_session = resets;
    }
    if let Some(welcome) = toml.session.welcome_on_reset {
        config.welcome_on_reset = welcome;
    }

    // Progress
    if let Some(ms) = toml.progress.tick_interval_ms {
        config.progress.tick_interval = Duration::from_millis(ms);
    }
    if let Some(increment) = toml.progress.increment {
        config.progress.increment = increment;
    }
    if let Some(cap) = toml.progress.cap {
        config.progress.cap = cap;
    }
    if let Some(ms) = toml.progress.reset_delay_ms {
        config.progress.reset_delay = Duration::from_millis(ms);
    }

    // Backend
    if let Some(ref url) = toml.backend.url {
        config.backend.url = url.clone();
    }
    if let Some(secs) = toml.backend.timeout_secs {
        config.backend.timeout = Duration::from_secs(secs);
    }

    // Limits
    if let Some(length) = toml.limits.max_input_length {
        config.max_input_length = length;
    }
    if let Some(bytes) = toml.limits.max_upload_bytes {
        config.max_upload_bytes = bytes;
    }

    // Download
    if let Some(ref dir) = toml.download.dir {
        config.download_dir = expand_home(dir);
    }
    if let Some(ref filename) = toml.download.filename {
        config.download_filename = filename.clone();
    }
}

fn parse_bool(value: &str) -> bool {
    value != "0" && !value.eq_ignore_ascii_case("false") && !value.eq_ignore_ascii_case("no")
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut ConductorConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("SUDOSOLVE_BACKEND_URL") {
        config.backend.url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(manual) = env("SUDOSOLVE_MANUAL_SOLVE") {
        config.manual_solve = parse_bool(&manual);
        config.source = ConfigSource::Env;
    }
    if let Some(resets) = env("SUDOSOLVE_CLEAR_RESETS_SESSION") {
        config.clear_resets_session = parse_bool(&resets);
        config.source = ConfigSource::Env;
    }
    if let Some(dir) = env("SUDOSOLVE_DOWNLOAD_DIR") {
        config.download_dir = expand_home(&dir);
        config.source = ConfigSource::Env;
    }
    if let Some(bytes) = env("SUDOSOLVE_MAX_UPLOAD_BYTES") {
        if let Ok(bytes) = bytes.parse::<usize>() {
            config.max_upload_bytes = bytes;
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %bytes, "Ignoring invalid SUDOSOLVE_MAX_UPLOAD_BYTES");
        }
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Backend URL override
    pub backend_url: Option<String>,

    /// Manual solve override
    pub manual_solve: Option<bool>,

    /// Clear-resets-session override
    pub clear_resets_session: Option<bool>,

    /// Download directory override
    pub download_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set backend URL override
    #[must_use]
    pub fn with_backend_url(mut self, url: String) -> Self {
        self.backend_url = Some(url);
        self
    }

    /// Set manual solve override
    #[must_use]
    pub fn with_manual_solve(mut self, manual: bool) -> Self {
        self.manual_solve = Some(manual);
        self
    }

    /// Set clear-resets-session override
    #[must_use]
    pub fn with_clear_resets_session(mut self, resets: bool) -> Self {
        self.clear_resets_session = Some(resets);
        self
    }

    /// Set download directory override
    #[must_use]
    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = Some(dir);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backend_url.is_none()
            && self.manual_solve.is_none()
            && self.clear_resets_session.is_none()
            && self.download_dir.is_none()
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ConductorConfig) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.backend_url {
            config.backend.url = url.clone();
        }
        if let Some(manual) = self.manual_solve {
            config.manual_solve = manual;
        }
        if let Some(resets) = self.clear_resets_session {
            config.clear_resets_session = resets;
        }
        if let Some(ref dir) = self.download_dir {
            config.download_dir = dir.clone();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
