//! Configuration for the agent
//!
//! Loaded once from a TOML file at startup; there is no hot-reload.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "Memgo.toml";

const DEFAULT_THRESHOLD_PERCENT: i64 = 90;
const DEFAULT_SAMPLE_INTERVAL_SECS: f64 = 0.5;
const DEFAULT_COMMAND_TIMEOUT_SECS: f64 = 30.0;

/// Runtime configuration for the coordinator
///
/// # Examples
///
/// ```
/// use memgo_agent::CleanerConfig;
/// use std::time::Duration;
///
/// let config = CleanerConfig::default();
/// assert_eq!(config.threshold_percent, 90);
/// assert_eq!(config.scheduled_interval(), None);
/// assert_eq!(config.sample_interval, Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CleanerConfig {
    /// Usage percentage at or above which a sample triggers a clean
    pub threshold_percent: u8,

    /// Minutes between scheduled cleans; 0 disables the schedule
    pub scheduled_interval_minutes: u64,

    /// Time between samples
    pub sample_interval: Duration,

    /// Upper bound on each external reclaim command
    pub command_timeout: Duration,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT as u8,
            scheduled_interval_minutes: 0,
            sample_interval: Duration::from_secs_f64(DEFAULT_SAMPLE_INTERVAL_SECS),
            command_timeout: Duration::from_secs_f64(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }
}

/// On-disk layout of the config file
///
/// ```toml
/// [AUTOCLEANER]
/// CLEAN_ABOVE = 90
/// CLEAN_INTERVAL = 0
///
/// [CONFIG]
/// UPDATE_INTERVAL = 0.5
/// COMMAND_TIMEOUT = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Cleaning policy
    #[serde(rename = "AUTOCLEANER", default)]
    pub autocleaner: AutoCleanerSection,

    /// General settings
    #[serde(rename = "CONFIG", default)]
    pub general: GeneralSection,
}

/// `[AUTOCLEANER]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCleanerSection {
    /// Threshold percentage (0 to 100)
    #[serde(rename = "CLEAN_ABOVE", default = "default_clean_above")]
    pub clean_above: i64,

    /// Scheduled clean interval in minutes, 0 = disabled
    #[serde(rename = "CLEAN_INTERVAL", default)]
    pub clean_interval: i64,
}

/// `[CONFIG]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSection {
    /// Seconds between samples; values <= 0 fall back to the default
    #[serde(rename = "UPDATE_INTERVAL", default = "default_update_interval")]
    pub update_interval: f64,

    /// Seconds allowed per external reclaim command; values <= 0 fall back to the default
    #[serde(rename = "COMMAND_TIMEOUT", default = "default_command_timeout")]
    pub command_timeout: f64,
}

fn default_clean_above() -> i64 {
    DEFAULT_THRESHOLD_PERCENT
}

fn default_update_interval() -> f64 {
    DEFAULT_SAMPLE_INTERVAL_SECS
}

fn default_command_timeout() -> f64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

impl Default for AutoCleanerSection {
    fn default() -> Self {
        Self {
            clean_above: default_clean_above(),
            clean_interval: 0,
        }
    }
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            update_interval: default_update_interval(),
            command_timeout: default_command_timeout(),
        }
    }
}

impl TryFrom<ConfigFile> for CleanerConfig {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, ConfigError> {
        let threshold_percent = u8::try_from(file.autocleaner.clean_above)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "CLEAN_ABOVE must be between 0 and 100, got {}",
                    file.autocleaner.clean_above
                ))
            })?;

        let scheduled_interval_minutes = u64::try_from(file.autocleaner.clean_interval)
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "CLEAN_INTERVAL must not be negative, got {}",
                    file.autocleaner.clean_interval
                ))
            })?;

        let scheduled_secs = scheduled_interval_minutes.checked_mul(60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "CLEAN_INTERVAL is too large, got {}",
                scheduled_interval_minutes
            ))
        })?;
        ensure_schedulable("CLEAN_INTERVAL", Duration::from_secs(scheduled_secs))?;

        let sample_interval = positive_secs(file.general.update_interval, DEFAULT_SAMPLE_INTERVAL_SECS);
        ensure_schedulable("UPDATE_INTERVAL", sample_interval)?;

        let command_timeout = positive_secs(file.general.command_timeout, DEFAULT_COMMAND_TIMEOUT_SECS);
        ensure_schedulable("COMMAND_TIMEOUT", command_timeout)?;

        Ok(Self {
            threshold_percent,
            scheduled_interval_minutes,
            sample_interval,
            command_timeout,
        })
    }
}

/// Reject durations that cannot be added to the current instant
fn ensure_schedulable(key: &str, duration: Duration) -> Result<(), ConfigError> {
    match Instant::now().checked_add(duration) {
        Some(_) => Ok(()),
        None => Err(ConfigError::Invalid(format!(
            "{} is too large, got {:?}",
            key, duration
        ))),
    }
}

/// Seconds as a Duration, with non-positive or non-finite values replaced by `fallback`
fn positive_secs(secs: f64, fallback: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or_else(|_| Duration::from_secs_f64(fallback))
    } else {
        Duration::from_secs_f64(fallback)
    }
}

impl CleanerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;
        Self::try_from(file)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load configuration from `path`, using defaults if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Scheduled clean period, or `None` when disabled
    pub fn scheduled_interval(&self) -> Option<Duration> {
        (self.scheduled_interval_minutes > 0)
            .then(|| Duration::from_secs(self.scheduled_interval_minutes.saturating_mul(60)))
    }

    /// Human-readable schedule description
    pub fn schedule_description(&self) -> String {
        match self.scheduled_interval_minutes {
            0 => "Disabled".to_string(),
            n => format!("Every {} minutes", n),
        }
    }

    /// Log the startup configuration banner
    pub fn log_banner(&self) {
        tracing::info!("MEMGO - Memory Cleaner");
        tracing::info!(
            threshold_percent = self.threshold_percent,
            schedule = %self.schedule_description(),
            sample_interval = ?self.sample_interval,
            command_timeout = ?self.command_timeout,
            "Configuration: clean threshold {}%, auto-clean interval {}",
            self.threshold_percent,
            self.schedule_description()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CleanerConfig::default();
        assert_eq!(config.threshold_percent, 90);
        assert_eq!(config.scheduled_interval_minutes, 0);
        assert_eq!(config.sample_interval, Duration::from_millis(500));
        assert_eq!(config.command_timeout, Duration::from_secs(30));
        assert_eq!(config.scheduled_interval(), None);
        assert_eq!(config.schedule_description(), "Disabled");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [AUTOCLEANER]
            CLEAN_ABOVE = 75
            CLEAN_INTERVAL = 15

            [CONFIG]
            UPDATE_INTERVAL = 2
            COMMAND_TIMEOUT = 5.5
        "#;

        let config = CleanerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.threshold_percent, 75);
        assert_eq!(config.scheduled_interval_minutes, 15);
        assert_eq!(config.scheduled_interval(), Some(Duration::from_secs(900)));
        assert_eq!(config.sample_interval, Duration::from_secs(2));
        assert_eq!(config.command_timeout, Duration::from_millis(5500));
        assert_eq!(config.schedule_description(), "Every 15 minutes");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = CleanerConfig::from_toml_str("").unwrap();
        assert_eq!(config, CleanerConfig::default());

        let partial = CleanerConfig::from_toml_str("[AUTOCLEANER]\nCLEAN_INTERVAL = 1\n").unwrap();
        assert_eq!(partial.threshold_percent, 90);
        assert_eq!(partial.scheduled_interval_minutes, 1);
    }

    #[test]
    fn test_non_positive_update_interval_resets() {
        for value in ["0", "-1.5"] {
            let toml = format!("[CONFIG]\nUPDATE_INTERVAL = {}\nCOMMAND_TIMEOUT = {}\n", value, value);
            let config = CleanerConfig::from_toml_str(&toml).unwrap();
            assert_eq!(config.sample_interval, Duration::from_millis(500));
            assert_eq!(config.command_timeout, Duration::from_secs(30));
        }
    }

    #[test]
    fn test_threshold_out_of_range() {
        for value in ["101", "-1"] {
            let toml = format!("[AUTOCLEANER]\nCLEAN_ABOVE = {}\n", value);
            let err = CleanerConfig::from_toml_str(&toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{} accepted", value);
        }
    }

    #[test]
    fn test_huge_interval_rejected() {
        for value in [i64::MAX.to_string(), "1000000000000000000".to_string()] {
            let toml = format!("[AUTOCLEANER]\nCLEAN_INTERVAL = {}\n", value);
            let err = CleanerConfig::from_toml_str(&toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{} accepted", value);
        }
    }

    #[test]
    fn test_huge_durations_rejected() {
        for key in ["UPDATE_INTERVAL", "COMMAND_TIMEOUT"] {
            let toml = format!("[CONFIG]\n{} = 1.8e19\n", key);
            let err = CleanerConfig::from_toml_str(&toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains(key)));
        }
    }

    #[test]
    fn test_scheduled_interval_saturates() {
        let config = CleanerConfig {
            scheduled_interval_minutes: u64::MAX,
            ..CleanerConfig::default()
        };
        assert_eq!(config.scheduled_interval(), Some(Duration::from_secs(u64::MAX)));
    }

    #[test]
    fn test_negative_interval_rejected() {
        let err = CleanerConfig::from_toml_str("[AUTOCLEANER]\nCLEAN_INTERVAL = -5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = CleanerConfig::from_toml_str("[AUTOCLEANER\nCLEAN_ABOVE = ").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));

        let err = CleanerConfig::from_toml_str("[AUTOCLEANER]\nCLEAN_ABOVE = \"high\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CleanerConfig::load(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, CleanerConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[AUTOCLEANER]\nCLEAN_ABOVE = 80").unwrap();

        let config = CleanerConfig::load(file.path()).unwrap();
        assert_eq!(config.threshold_percent, 80);
    }

    #[test]
    fn test_from_file_missing_is_error() {
        let err = CleanerConfig::from_file("/nonexistent/memgo/Memgo.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_serde_roundtrip() {
        let file = ConfigFile::default();
        let serialized = toml::to_string(&file).unwrap();
        assert!(serialized.contains("CLEAN_ABOVE = 90"));

        let config = CleanerConfig::from_toml_str(&serialized).unwrap();
        assert_eq!(config, CleanerConfig::default());
    }
}
