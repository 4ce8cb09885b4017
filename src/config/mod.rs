//! # Configuration
//!
//! Realm reads a single TOML file split into sections:
//!
//! - [`GameConfig`] - world data directory, start location, offline rate
//! - [`StorageConfig`] - where the sled save database lives
//! - [`ServerConfig`] - bind address and CORS origin for the HTTP service
//! - [`GenerationConfig`] - hosted text model used by `talk`, `imagine` and `suggest quest`
//! - [`LoggingConfig`] - log level and optional log file
//!
//! Every section has serde defaults, so a file only needs the keys it changes.
//!
//! ```rust,no_run
//! use realm::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("World data in {}", config.game.data_dir);
//!     Ok(())
//! }
//! ```
//!
//! ```toml
//! [game]
//! data_dir = "data/world"
//! start_location = "starting_village"
//! offline_exp_rate = 0.1
//!
//! [server]
//! bind = "127.0.0.1:8787"
//! allowed_origin = "*"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Directory holding locations.json, creatures.json and quests.json
    pub data_dir: String,
    pub start_location: String,
    /// Experience credited per second spent offline
    pub offline_exp_rate: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/world".to_string(),
            start_location: "starting_village".to_string(),
            offline_exp_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// sled database directory for saved games
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "data/realm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Value of Access-Control-Allow-Origin; "*" allows any origin
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            allowed_origin: "*".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Off by default until an API key is provided
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: String::new(),
            timeout_seconds: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("realm.log".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Parsed level, falling back to `Info` for unknown names.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let rate = self.game.offline_exp_rate;
        if !rate.is_finite() || rate < 0.0 {
            return Err(anyhow!(
                "game.offline_exp_rate must be a non-negative number (got {})",
                rate
            ));
        }
        if self.game.start_location.trim().is_empty() {
            return Err(anyhow!("game.start_location must not be empty"));
        }
        if self.generation.timeout_seconds == 0 {
            return Err(anyhow!("generation.timeout_seconds must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.game.start_location, "starting_village");
        assert_eq!(config.game.offline_exp_rate, 0.1);
        assert!(!config.generation.enabled);
        assert_eq!(config.server.allowed_origin, "*");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [game]
            offline_exp_rate = 0.5

            [generation]
            enabled = true
            api_key = "k"
            "#,
        )
        .unwrap();
        assert_eq!(config.game.offline_exp_rate, 0.5);
        assert_eq!(config.game.data_dir, "data/world");
        assert_eq!(config.generation.model, "gemini-2.0-flash");
        assert_eq!(config.storage.db_path, "data/realm");
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.game.offline_exp_rate = -0.1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.game.start_location = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.generation.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let logging = LoggingConfig {
            level: "chatty".to_string(),
            file: None,
        };
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
        let logging = LoggingConfig {
            level: "debug".to_string(),
            file: None,
        };
        assert_eq!(logging.level_filter(), log::LevelFilter::Debug);
    }

    #[tokio::test]
    async fn create_default_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.server.bind, "127.0.0.1:8787");
        assert_eq!(loaded.logging.file.as_deref(), Some("realm.log"));
    }
}
