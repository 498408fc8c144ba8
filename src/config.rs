//! Configuration for the Synheart Presence detector.

use crate::collector::types::SignalKind;
use crate::core::verdict::VerdictPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration.
///
/// Scoring constants (buffer sizes, steps, weights, the observation window)
/// are fixed and deliberately not configurable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Period of the session-duration tick in live mode
    #[serde(with = "duration_serde")]
    pub tick_interval: Duration,

    /// Which signals to capture
    pub sources: SourceConfig,

    /// Whether a verdict may change after it is first issued
    #[serde(default)]
    pub verdict_policy: VerdictPolicy,

    /// Path for exporting session reports
    pub export_path: PathBuf,

    /// Path for storing transparency logs
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-presence");

        Self {
            tick_interval: Duration::from_secs(1),
            sources: SourceConfig::default(),
            verdict_policy: VerdictPolicy::default(),
            export_path: data_dir.join("reports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults if it
    /// does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-presence")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }
}

/// Configuration for which signals to capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub pointer: bool,
    pub click: bool,
    pub key: bool,
    pub scroll: bool,
    pub touch: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            pointer: true,
            click: true,
            key: true,
            scroll: true,
            touch: true,
        }
    }
}

impl SourceConfig {
    /// Parse source configuration from a comma-separated string.
    pub fn from_csv(s: &str) -> Self {
        let sources: Vec<String> = s.split(',').map(|s| s.trim().to_lowercase()).collect();
        let has = |name: &str| sources.iter().any(|s| s == name || s == "all");

        Self {
            pointer: has("pointer"),
            click: has("click"),
            key: has("key"),
            scroll: has("scroll"),
            touch: has("touch"),
        }
    }

    pub fn is_enabled(&self, kind: SignalKind) -> bool {
        match kind {
            SignalKind::Pointer => self.pointer,
            SignalKind::Click => self.click,
            SignalKind::Key => self.key,
            SignalKind::Scroll => self.scroll,
            SignalKind::Touch => self.touch,
        }
    }

    /// Check if at least one source is enabled.
    pub fn any_enabled(&self) -> bool {
        SignalKind::ALL.iter().any(|&k| self.is_enabled(k))
    }

    /// Comma-separated list of enabled sources.
    pub fn to_csv(&self) -> String {
        SignalKind::ALL
            .iter()
            .filter(|&&k| self.is_enabled(k))
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
}

/// Serde support for Duration, stored as milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
