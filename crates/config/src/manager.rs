//! Configuration manager - main API for config operations

use crate::app_config::LogLevel;
use crate::persistence::ConfigFile;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "audioshelf";
const ENV_PREFIX: &str = "AUDIOSHELF";

/// Main configuration manager
///
/// Owns the config file location and the default data directory.
pub struct ConfigManager {
    file: ConfigFile,
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a config manager using the platform directories
    ///
    /// - Linux: `~/.config/audioshelf/`, data in `~/.local/share/audioshelf/`
    /// - macOS: `~/Library/Application Support/audioshelf/`
    /// - Windows: `%APPDATA%\audioshelf\`
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", APP_NAME).ok_or(ConfigError::NoConfigDirectory)?;
        Ok(Self::with_directories(
            dirs.config_dir().to_path_buf(),
            dirs.data_dir().to_path_buf(),
        ))
    }

    /// Uses `config_dir` for both the config file and the data directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let data_dir = config_dir.clone();
        Ok(Self::with_directories(config_dir, data_dir))
    }

    pub fn with_directories(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            file: ConfigFile::new(config_dir.join("config.toml")),
            config_dir,
            data_dir,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Data directory for `config`: `app.data_dir` if set, else the
    /// platform default
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        config
            .app
            .data_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.clone())
    }

    /// Directory holding the book records for `config`
    pub fn books_dir(&self, config: &Config) -> PathBuf {
        config.storage.books_dir(&self.data_dir(config))
    }

    /// Loads the configuration, upgrading an older file in place
    ///
    /// A missing file gives defaults; an unreadable one is an error.
    pub fn load(&self) -> ConfigResult<Config> {
        self.file.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and atomically saves the configuration
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.save(config)
    }

    /// Loads, applies `update_fn`, and saves
    ///
    /// ```rust,no_run
    /// # use audioshelf_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.player.skip_interval_secs = 30;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if none exists
    ///
    /// Returns Ok(true) if a new file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.file.save(&Config::default())?;
        Ok(true)
    }

    /// Overwrites the config file with defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Returns every validation problem of the stored config
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config and applies `AUDIOSHELF_<SECTION>_<FIELD>` overrides
    ///
    /// Example: `AUDIOSHELF_STORAGE_FLUSH_DEBOUNCE_MS=250`
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

/// Applies overrides looked up through `lookup`; unparsable values are logged
/// and ignored
pub(crate) fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |section: &str, field: &str| {
        let key = format!("{}_{}_{}", ENV_PREFIX, section, field);
        lookup(&key).map(|value| (key, value))
    };

    fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
        let parsed = value.trim().parse().ok();
        if parsed.is_none() {
            log::warn!("Ignoring {}: cannot parse '{}'", key, value);
        }
        parsed
    }

    if let Some((key, value)) = var("APP", "LOG_LEVEL") {
        if let Some(level) = parse::<LogLevel>(&key, &value) {
            config.app.log_level = level;
        }
    }
    if let Some((_, value)) = var("APP", "DATA_DIR") {
        config.app.data_dir = Some(PathBuf::from(value));
    }

    if let Some((key, value)) = var("PLAYER", "DEFAULT_RATE") {
        if let Some(rate) = parse(&key, &value) {
            config.player.default_rate = rate;
        }
    }
    if let Some((key, value)) = var("PLAYER", "SKIP_INTERVAL_SECS") {
        if let Some(secs) = parse(&key, &value) {
            config.player.skip_interval_secs = secs;
        }
    }

    if let Some((_, value)) = var("STORAGE", "BOOKS_DIR_NAME") {
        config.storage.books_dir_name = value;
    }
    if let Some((key, value)) = var("STORAGE", "FLUSH_DEBOUNCE_MS") {
        if let Some(ms) = parse(&key, &value) {
            config.storage.flush_debounce_ms = ms;
        }
    }
    if let Some((key, value)) = var("STORAGE", "VALIDATION_INTERVAL_SECS") {
        if let Some(secs) = parse(&key, &value) {
            config.storage.validation_interval_secs = secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        let config = manager.load_or_default();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_with_corrupt_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[[[").expect("Should write");
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        manager
            .update(|config| {
                config.player.skip_interval_secs = 45;
            })
            .expect("Should update");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded.player.skip_interval_secs, 45);
    }

    #[test]
    fn test_initialize_creates_file_once() {
        let (_temp_dir, manager) = setup_test_manager();

        assert!(manager.initialize().expect("Should initialize"));
        assert!(manager.config_path().exists());
        assert!(!manager.initialize().expect("Should initialize"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.storage.validation_interval_secs = 0;
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");
        assert_eq!(manager.load().expect("Should load"), Config::default());
    }

    #[test]
    fn test_validate_invalid_config_is_not_saved() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.storage.flush_debounce_ms = 0;
        manager
            .save(&config)
            .expect_err("Should not save invalid config");
        assert!(manager.validate().expect("Should validate").is_empty());
    }

    #[test]
    fn test_books_dir_follows_data_dir() {
        let manager = ConfigManager::with_directories(
            PathBuf::from("/etc/shelf"),
            PathBuf::from("/var/shelf"),
        );
        let mut config = Config::default();
        assert_eq!(manager.books_dir(&config), PathBuf::from("/var/shelf/books"));

        config.app.data_dir = Some(PathBuf::from("/mnt/books-root"));
        assert_eq!(
            manager.books_dir(&config),
            PathBuf::from("/mnt/books-root/books")
        );
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("AUDIOSHELF_APP_LOG_LEVEL", "debug"),
            ("AUDIOSHELF_PLAYER_DEFAULT_RATE", "1.5"),
            ("AUDIOSHELF_STORAGE_FLUSH_DEBOUNCE_MS", "250"),
            ("AUDIOSHELF_STORAGE_VALIDATION_INTERVAL_SECS", "soon"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.app.log_level, LogLevel::Debug);
        assert_eq!(config.player.default_rate, 1.5);
        assert_eq!(config.storage.flush_debounce_ms, 250);
        // Unparsable values are ignored
        assert_eq!(config.storage.validation_interval_secs, 300);
    }

    #[test]
    fn test_config_file_path() {
        let (_temp_dir, manager) = setup_test_manager();
        assert!(manager.config_path().ends_with("config.toml"));
    }
}
