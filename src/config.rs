// Application configuration
// Broker, storage and detection settings loaded from an optional JSON file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::events::calibration::MAX_THRESHOLD;
use crate::events::debounce::DEFAULT_COOLDOWN_MS;
use crate::events::heuristic::ClassifierConfig;
use crate::state::history::{HISTORY_CAPACITY, HISTORY_KEY, MAX_HISTORY_CAPACITY};

/// Config file name inside the app data directory
pub const CONFIG_FILE_NAME: &str = "neurosense.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// MQTT broker host
    pub broker_host: String,

    /// MQTT broker TCP port
    pub broker_port: u16,

    /// Topic every alert is published to
    pub topic: String,

    /// Client ids are this prefix plus 8 random hex characters
    pub client_id_prefix: String,

    /// MQTT keep-alive interval in seconds
    pub keep_alive_secs: u64,

    /// Storage key of the persisted event history
    pub history_key: String,

    /// Maximum number of history entries kept
    pub history_capacity: usize,

    /// Minimum time between dispatches, in milliseconds
    pub cooldown_ms: i64,

    /// Threshold used until the user calibrates
    pub initial_threshold: u8,

    /// Classifier rule constants
    pub classifier: ClassifierConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            broker_host: "broker.hivemq.com".to_string(),
            broker_port: 1883,
            topic: "neurosense/demo/cmd".to_string(),
            client_id_prefix: "neurosense_app_".to_string(),
            keep_alive_secs: 5,
            history_key: HISTORY_KEY.to_string(),
            history_capacity: HISTORY_CAPACITY,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            initial_threshold: 45,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read and validate a config file; absent fields take their defaults
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let data = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`AppConfig::load`], but falls back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return AppConfig::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config at {}: {}", path.display(), e);
                AppConfig::default()
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.history_capacity == 0 || self.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(ConfigError::Invalid {
                field: "history_capacity",
                reason: format!("must be between 1 and {}", MAX_HISTORY_CAPACITY),
            });
        }
        if self.initial_threshold > MAX_THRESHOLD {
            return Err(ConfigError::Invalid {
                field: "initial_threshold",
                reason: format!("{} is above {}", self.initial_threshold, MAX_THRESHOLD),
            });
        }
        if self.keep_alive_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "keep_alive_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.cooldown_ms < 0 {
            return Err(ConfigError::Invalid {
                field: "cooldown_ms",
                reason: "must not be negative".to_string(),
            });
        }
        if self.classifier.spike_delta <= 0 {
            return Err(ConfigError::Invalid {
                field: "classifier.spike_delta",
                reason: "must be positive".to_string(),
            });
        }
        if self.classifier.sustained_margin < 0 {
            return Err(ConfigError::Invalid {
                field: "classifier.sustained_margin",
                reason: "must not be negative".to_string(),
            });
        }
        if self.topic.is_empty() {
            return Err(ConfigError::Invalid {
                field: "topic",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Fresh client id: prefix plus 8 random hex characters
    pub fn client_id(&self) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}{}", self.client_id_prefix, &suffix[..8])
    }

    /// Default config location inside the app data directory
    pub fn default_path(app_data_dir: &Path) -> PathBuf {
        app_data_dir.join(CONFIG_FILE_NAME)
    }
}
