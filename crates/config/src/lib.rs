//! audioshelf configuration
//!
//! One TOML file with three sections:
//! - `[app]`: log level and an optional data directory override
//! - `[player]`: rate bounds and skip interval
//! - `[storage]`: book record location, flush debounce and validation cadence
//!
//! Sections implement [`ConfigSection`]. Files are written atomically, backed
//! up before every overwrite, and migrated forward on load.
//!
//! ```rust,no_run
//! use audioshelf_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Books live in {}", manager.books_dir(&config).display());
//! ```

mod error;
mod manager;
mod migration;
mod persistence;
mod validation;

// Config sections
pub mod app_config;
mod player_config;
mod storage_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use player_config::{PlayerConfig, RATE_LIMITS};
pub use storage_config::StorageConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version for migrations
pub const CONFIG_VERSION: u32 = 2;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    pub app: AppConfig,

    pub player: PlayerConfig,

    pub storage: StorageConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates every section and returns all errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.player.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.storage.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges `other` into this config, preferring its values
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.player.merge(other.player);
        self.storage.merge(other.storage);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            player: PlayerConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}
