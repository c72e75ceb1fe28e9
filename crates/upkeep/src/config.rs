use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::monitoring::registry::{EndpointRegistry, RegistryError};
use crate::monitoring::validation::{MAX_INTERVAL_SECONDS, MIN_INTERVAL_SECONDS, clamp_interval};

/// Default config file name
pub const CONFIG_FILE: &str = "upkeep_config.json";

/// Default poll interval in seconds
pub const DEFAULT_INTERVAL_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to write {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {reason}")]
    ParseFailed { path: path::PathBuf, reason: String },
    #[error("failed to serialize config: {0}")]
    SerializeFailed(String),
}

/// Persisted state of the monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Endpoints in registry order
    #[serde(default)]
    pub servers: Vec<String>,
    /// Theme of the presentation layer, only round-tripped here
    #[serde(default)]
    pub dark_mode: bool,
    /// Poll interval in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECONDS
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { servers: Vec::new(), dark_mode: false, interval: DEFAULT_INTERVAL_SECONDS }
    }
}

impl MonitorConfig {
    /// Build the registry described by `servers`.
    ///
    /// Entries the registry refuses are dropped with a warning, so a hand
    /// edited file can never exceed the capacity or hold duplicates.
    pub fn to_registry(&self) -> EndpointRegistry {
        let mut registry = EndpointRegistry::new();
        for id in &self.servers {
            match registry.add(id) {
                Ok(_) => {}
                Err(RegistryError::AtCapacity { capacity }) => {
                    warn!(endpoint = %id, "Ignoring configured server, maximum {} allowed", capacity);
                }
                Err(e) => warn!(endpoint = %id, "Ignoring configured server: {}", e),
            }
        }
        registry
    }

    /// Clamp out-of-range values and drop unusable servers
    pub fn normalized(mut self) -> Self {
        let clamped = clamp_interval(self.interval);
        if clamped != self.interval {
            warn!(
                "Configured interval {}s outside {}..={}s, using {}s",
                self.interval, MIN_INTERVAL_SECONDS, MAX_INTERVAL_SECONDS, clamped
            );
            self.interval = clamped;
        }
        self.servers = self.to_registry().to_ids();
        self
    }
}

impl fmt::Display for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_1 = write_indented(0);
        let write_2 = write_indented(1);

        writeln!(f, "Current Monitor Configuration:")?;
        write_1(f, "Poll Interval", &format!("{}s", self.interval))?;
        write_1(f, "Dark Mode", &self.dark_mode)?;
        write_1(f, "Servers", &self.servers.len())?;
        for (idx, server) in self.servers.iter().enumerate() {
            write_2(f, &format!("{}", idx + 1), server)?;
        }

        Ok(())
    }
}

/// On-disk encoding, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &path::Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Get default config path ($XDG_CONFIG_HOME/upkeep/upkeep_config.json,
/// $HOME/.config/..., or the working directory)
pub fn default_config_path() -> path::PathBuf {
    if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        if !config_home.is_empty() {
            return path::PathBuf::from(config_home).join("upkeep").join(CONFIG_FILE);
        }
    }

    match env::home_dir() {
        Some(home_dir) => home_dir.join(".config").join("upkeep").join(CONFIG_FILE),
        None => path::PathBuf::from(CONFIG_FILE),
    }
}

/// Loads and saves [`MonitorConfig`] at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: path::PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &path::Path {
        &self.path
    }

    /// Load the config, a missing file yields the defaults
    pub fn load(&self) -> Result<MonitorConfig, ConfigError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(MonitorConfig::default());
        }

        let raw_string = fs::read_to_string(&self.path)
            .map_err(|source| ConfigError::ReadFailed { path: self.path.clone(), source })?;

        let parse_failed = |reason: String| ConfigError::ParseFailed { path: self.path.clone(), reason };
        let config: MonitorConfig = match Format::of(&self.path) {
            Format::Json => serde_json::from_str(&raw_string).map_err(|e| parse_failed(e.to_string()))?,
            Format::Toml => toml::from_str(&raw_string).map_err(|e| parse_failed(e.to_string()))?,
        };

        Ok(config.normalized())
    }

    /// Load the config, falling back to the defaults when the file cannot be
    /// used. A file that does not parse is moved to `<name>.corrupt` so the
    /// next save does not overwrite it.
    pub fn load_or_default(&self) -> MonitorConfig {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Using default configuration: {}", e);
                if matches!(e, ConfigError::ParseFailed { .. }) {
                    self.set_aside();
                }
                MonitorConfig::default()
            }
        }
    }

    /// Path a corrupt config is moved to
    pub fn corrupt_path(&self) -> path::PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    fn set_aside(&self) {
        let target = self.corrupt_path();
        match fs::rename(&self.path, &target) {
            Ok(()) => warn!(path = %target.display(), "Moved unreadable configuration aside"),
            Err(e) => warn!("Failed to move {} aside: {}", self.path.display(), e),
        }
    }

    /// Serialize and write a config to the file
    pub fn save(&self, config: &MonitorConfig) -> Result<(), ConfigError> {
        let config_str = match Format::of(&self.path) {
            Format::Json => serde_json::to_string(config)
                .map_err(|e| ConfigError::SerializeFailed(e.to_string()))?,
            Format::Toml => toml::to_string_pretty(config)
                .map_err(|e| ConfigError::SerializeFailed(e.to_string()))?,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::WriteFailed { path: parent.to_path_buf(), source })?;
        }

        fs::write(&self.path, config_str)
            .map_err(|source| ConfigError::WriteFailed { path: self.path.clone(), source })
    }
}
