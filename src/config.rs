use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const USER_ENV: &str = "HABITPET_USER";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub user_id: String,
    #[serde(default = "default_debounce_ms")]
    pub persist_debounce_ms: u64,
    /// Minutes east of UTC used to decide where a calendar day starts.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load `config.json` from `data_dir` (default `<config_dir>/habitpet`),
    /// writing a default one first if there is none.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("habitpet")
        });

        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");
        let mut config = if config_path.exists() {
            let config_str =
                std::fs::read_to_string(&config_path).context("Failed to read config.json")?;
            if config_str.trim().is_empty() {
                tracing::warn!(path = %config_path.display(), "config file is empty, recreating");
                Self::write_default(data_dir.clone())?
            } else {
                let mut config: Config =
                    serde_json::from_str(&config_str).context("Failed to parse config.json")?;
                config.data_dir = data_dir;
                config
            }
        } else {
            Self::write_default(data_dir)?
        };

        if let Ok(user) = std::env::var(USER_ENV) {
            if !user.trim().is_empty() {
                config.user_id = user.trim().to_string();
            }
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = self.data_dir.join("config.json");
        let json_str = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, json_str).context("Failed to write config.json")?;
        Ok(())
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    fn write_default(data_dir: PathBuf) -> Result<Self> {
        let config = Self::default_config(data_dir);
        config.save().context("Failed to write default config.json")?;
        Ok(config)
    }

    fn default_config(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            user_id: "local".to_string(),
            persist_debounce_ms: default_debounce_ms(),
            utc_offset_minutes: 0,
            rng_seed: None,
            confirmation: None,
        }
    }
}
