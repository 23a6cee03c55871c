//! TOML-based configuration for the monitor.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Linux:    `~/.config/tapreplay/config.toml` (or `$XDG_CONFIG_HOME/tapreplay`)
//! - macOS:    `~/Library/Application Support/TapReplay/config.toml`
//! - Windows:  `%APPDATA%\TapReplay\config.toml`
//!
//! or from an explicit path given with `--config`.
//!
//! # Example
//!
//! ```toml
//! [screen]
//! width = 1080
//! height = 2400
//! raw_max = 4095
//!
//! [source]
//! device = "/dev/input/event3"
//! serial = "emulator-5554"
//!
//! [replay]
//! policy = "hold"
//! interval_ms = 10
//! ```
//!
//! # Serde default values
//!
//! Every section and every field has a default, so an empty file (or no file
//! at all) is a valid configuration.  Fields annotated with
//! `#[serde(default = "some_fn")]` use the return value of `some_fn()` when
//! absent.
//!
//! The raw file values are validated into core types ([`ScreenGeometry`],
//! [`ReplayPolicy`]) by the accessor methods, not at parse time, so a parse
//! error always means malformed TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tapreplay_core::{
    GeometryError, LineDialect, PolicyError, ReplayPolicy, SampleScope, ScreenGeometry,
};
use thiserror::Error;

use crate::application::replay_taps::DEFAULT_MAX_IN_FLIGHT;
use crate::infrastructure::event_source::{SourceCommand, SourceError};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid [screen] settings: {0}")]
    Geometry(#[from] GeometryError),

    #[error("invalid [replay] settings: {0}")]
    Policy(#[from] PolicyError),

    #[error("invalid [source] settings: {0}")]
    Source(#[from] SourceError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Display size and sensor range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenConfig {
    /// Display width in pixels.
    #[serde(default = "default_screen_width")]
    pub width: u32,
    /// Display height in pixels.
    #[serde(default = "default_screen_height")]
    pub height: u32,
    /// Largest raw value the sensor reports on either axis.
    #[serde(default = "default_raw_max")]
    pub raw_max: u32,
    /// Clamp raw values above `raw_max` instead of scaling them off-screen.
    #[serde(default)]
    pub clamp: bool,
}

/// Where raw events come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// `adb` executable, used both for `getevent` and for `input tap`.
    #[serde(default = "default_adb_path")]
    pub adb_path: String,
    /// Device serial passed as `adb -s`; needed when several are attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Input device node to watch.
    #[serde(default = "default_device")]
    pub device: String,
    /// Full argv replacing the `adb shell getevent -l` command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// `"strict"` or `"lenient"` line matching.
    #[serde(default)]
    pub dialect: LineDialect,
}

/// Which replay policy runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Burst,
    Hold,
}

/// Replay policy parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplayConfig {
    #[serde(default)]
    pub policy: PolicyKind,
    /// Taps per burst.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Debounce window for bursts.  Defaults to two milliseconds per tap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    /// Tick period while held.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Concurrent bursts allowed before new ones are skipped.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// `"contact_only"` or `"carry_pre_contact"`.
    #[serde(default)]
    pub sample_scope: SampleScope,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_screen_width() -> u32 {
    1080
}
fn default_screen_height() -> u32 {
    2400
}
fn default_raw_max() -> u32 {
    4095
}
fn default_adb_path() -> String {
    "adb".to_string()
}
fn default_device() -> String {
    "/dev/input/event3".to_string()
}
fn default_count() -> u32 {
    tapreplay_core::domain::gesture::DEFAULT_REPLAY_COUNT
}
fn default_interval_ms() -> u64 {
    10
}
fn default_max_in_flight() -> usize {
    DEFAULT_MAX_IN_FLIGHT
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
            raw_max: default_raw_max(),
            clamp: false,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            serial: None,
            device: default_device(),
            command: None,
            dialect: LineDialect::default(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            count: default_count(),
            debounce_ms: None,
            interval_ms: default_interval_ms(),
            max_in_flight: default_max_in_flight(),
            sample_scope: SampleScope::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Validation into core types ────────────────────────────────────────────────

impl ScreenConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Geometry`] for a zero `raw_max` or an empty screen.
    pub fn geometry(&self) -> Result<ScreenGeometry, ConfigError> {
        Ok(ScreenGeometry::new(self.raw_max, self.width, self.height)?.with_clamp(self.clamp))
    }
}

impl ReplayConfig {
    pub fn debounce(&self) -> Duration {
        let ms = self
            .debounce_ms
            .unwrap_or_else(|| u64::from(self.count).saturating_mul(2));
        Duration::from_millis(ms)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Policy`] for a zero burst count or tick interval.
    pub fn policy(&self) -> Result<ReplayPolicy, ConfigError> {
        let policy = match self.policy {
            PolicyKind::Burst => ReplayPolicy::burst(self.count, self.debounce())?,
            PolicyKind::Hold => ReplayPolicy::hold(Duration::from_millis(self.interval_ms))?,
        };
        Ok(policy)
    }
}

impl SourceConfig {
    /// The command producing the raw event stream.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Source`] when `command` is set but empty.
    pub fn event_command(&self) -> Result<SourceCommand, ConfigError> {
        match &self.command {
            Some(argv) => Ok(SourceCommand::from_argv(argv.clone())?),
            None => Ok(SourceCommand::getevent(
                &self.adb_path,
                self.serial.as_deref(),
                &self.device,
            )),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the default location, returning
/// `AppConfig::default()` if the file does not exist yet.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;
    read_config(&path, true)
}

/// Loads `AppConfig` from an explicit path.  Unlike [`load_config`], a
/// missing file is an error.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    read_config(path, false)
}

/// Renders `config` as pretty TOML.
///
/// # Errors
///
/// Returns [`ConfigError::Serialize`] if serialization fails.
pub fn render_config(config: &AppConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

fn read_config(path: &Path, missing_ok: bool) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if missing_ok && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("TapReplay"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("tapreplay"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("TapReplay")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
