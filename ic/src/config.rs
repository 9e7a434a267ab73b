//! Configuration for the `ic` binary

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Sampling interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Number of concurrent demo producers
    #[serde(default = "default_producers")]
    pub producers: usize,

    /// Delay between sends of a single producer in milliseconds
    #[serde(default = "default_send_every_ms")]
    pub send_every_ms: u64,

    /// How long the demo runs in milliseconds
    #[serde(default = "default_run_ms")]
    pub run_ms: u64,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_interval_ms() -> u64 {
    crate::DEFAULT_INTERVAL_MS
}

fn default_producers() -> usize {
    4
}

fn default_send_every_ms() -> u64 {
    5
}

fn default_run_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            producers: default_producers(),
            send_every_ms: default_send_every_ms(),
            run_ms: default_run_ms(),
            log_level: None,
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            debug!(path = %config_path.display(), "Config::load: explicit path");
            return Self::from_file(config_path);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("intervalchannel").join("config.yml")),
            Some(PathBuf::from("intervalchannel.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "Config::load: found default config");
                return Self::from_file(path);
            }
        }

        debug!("Config::load: no config file, using defaults");
        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the demo cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(eyre!("interval_ms must be greater than zero"));
        }
        if self.producers == 0 {
            return Err(eyre!("producers must be greater than zero"));
        }
        Ok(())
    }

    /// Get the sampling interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Get the producer send cadence as a Duration
    pub fn send_every(&self) -> Duration {
        Duration::from_millis(self.send_every_ms)
    }

    /// Get the demo duration as a Duration
    pub fn run_for(&self) -> Duration {
        Duration::from_millis(self.run_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.interval_ms, 100);
        assert_eq!(config.producers, 4);
        assert_eq!(config.send_every_ms, 5);
        assert_eq!(config.run_ms, 1000);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_durations() {
        let config = Config {
            interval_ms: 250,
            send_every_ms: 10,
            run_ms: 2000,
            ..Default::default()
        };
        assert_eq!(config.interval(), Duration::from_millis(250));
        assert_eq!(config.send_every(), Duration::from_millis(10));
        assert_eq!(config.run_for(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("interval_ms: 40\nlog_level: DEBUG\n").unwrap();
        assert_eq!(config.interval_ms, 40);
        assert_eq!(config.producers, 4);
        assert_eq!(config.log_level.as_deref(), Some("DEBUG"));
    }

    #[test]
    fn test_save_and_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        let config = Config {
            interval_ms: 20,
            producers: 2,
            ..Default::default()
        };

        config.save(&path).unwrap();
        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let zero_interval = Config {
            interval_ms: 0,
            ..Default::default()
        };
        assert!(zero_interval.validate().is_err());

        let no_producers = Config {
            producers: 0,
            ..Default::default()
        };
        assert!(no_producers.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_working_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("intervalchannel.yml"), "interval_ms: 33\n").unwrap();

        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let loaded = Config::load(None);
        std::env::set_current_dir(original).unwrap();

        // A user-level config takes precedence when present
        let user_config = dirs::config_dir().map(|p| p.join("intervalchannel").join("config.yml"));
        if !user_config.is_some_and(|p| p.exists()) {
            assert_eq!(loaded.unwrap().interval_ms, 33);
        }
    }
}
