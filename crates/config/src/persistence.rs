//! The config file on disk
//!
//! A file is read as a raw TOML table first so older layouts can be upgraded
//! before they meet [`Config`]; an upgraded file is written back straight
//! away. Saving refuses invalid values, keeps the previous file next to the
//! new one as `config.toml.backup`, and swaps the new file in with a rename.

use crate::migration::migrate_to_latest;
use crate::{Config, ConfigError, ConfigResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.backup")
    }

    /// Reads the config, upgrading an older file on the way
    ///
    /// No file means defaults. Bad values are logged, not rejected, so a
    /// hand-edited file never locks the user out.
    pub fn load(&self) -> ConfigResult<Config> {
        let Some(mut table) = self.read_table()? else {
            log::info!("No config at {}, using defaults", self.path.display());
            return Ok(Config::default());
        };

        let upgraded = migrate_to_latest(&mut table)?;
        let config: Config = toml::Value::Table(table)
            .try_into()
            .map_err(|source| self.parse_error(source))?;

        if upgraded {
            self.write(&config)?;
            log::info!("Rewrote upgraded config at {}", self.path.display());
        }

        if let Err(errors) = config.validate() {
            for error in &errors {
                log::warn!("Config {}", error);
            }
        }
        Ok(config)
    }

    /// Writes `config` if every field is valid
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        self.write(config)?;
        log::info!("Config saved to {}", self.path.display());
        Ok(())
    }

    fn read_table(&self) -> ConfigResult<Option<toml::Table>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.path.clone(),
            });
        }
        toml::from_str(&text)
            .map(Some)
            .map_err(|source| self.parse_error(source))
    }

    /// Backs up the current file and atomically replaces it
    fn write(&self, config: &Config) -> ConfigResult<()> {
        let text = toml::to_string_pretty(config)?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let failed = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ConfigError::Write { path, source }
        };

        fs::create_dir_all(dir).map_err(failed(dir))?;

        if self.path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(failed(&backup))?;
            log::debug!("Backed up config to {}", backup.display());
        }

        let mut temp = NamedTempFile::new_in(dir).map_err(failed(dir))?;
        temp.write_all(text.as_bytes())
            .and_then(|()| temp.flush())
            .map_err(failed(temp.path()))?;
        temp.persist(&self.path)
            .map_err(|e| failed(&self.path)(e.error))?;
        Ok(())
    }

    fn parse_error(&self, source: toml::de::Error) -> ConfigError {
        ConfigError::Parse {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CONFIG_VERSION;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn config_file() -> Result<(TempDir, ConfigFile), std::io::Error> {
        let temp_dir = TempDir::new()?;
        let file = ConfigFile::new(temp_dir.path().join("config.toml"));
        Ok((temp_dir, file))
    }

    #[test]
    fn test_missing_file_gives_defaults() -> TestResult {
        let (_temp_dir, file) = config_file()?;
        assert_eq!(file.load()?, Config::default());
        assert!(!file.path().exists());
        Ok(())
    }

    #[test]
    fn test_blank_file_is_empty_error() -> TestResult {
        let (_temp_dir, file) = config_file()?;
        fs::write(file.path(), "  \n\t\n")?;
        assert!(matches!(file.load(), Err(ConfigError::Empty { .. })));
        Ok(())
    }

    #[test]
    fn test_save_creates_directory() -> TestResult {
        let temp_dir = TempDir::new()?;
        let file = ConfigFile::new(temp_dir.path().join("nested").join("config.toml"));

        file.save(&Config::default())?;
        assert_eq!(file.load()?, Config::default());
        Ok(())
    }

    #[test]
    fn test_backup_holds_previous_file() -> TestResult {
        let (_temp_dir, file) = config_file()?;
        let mut config = Config::default();
        config.storage.flush_debounce_ms = 250;
        file.save(&config)?;

        config.storage.flush_debounce_ms = 750;
        file.save(&config)?;

        let backup: Config = toml::from_str(&fs::read_to_string(file.backup_path())?)?;
        assert_eq!(backup.storage.flush_debounce_ms, 250);
        assert_eq!(file.load()?.storage.flush_debounce_ms, 750);
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_not_saved() -> TestResult {
        let (_temp_dir, file) = config_file()?;
        let mut config = Config::default();
        config.player.default_rate = 9.0;
        config.storage.flush_debounce_ms = 0;

        match file.save(&config) {
            Err(ConfigError::Invalid(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert!(fields.contains(&"player.default_rate"));
                assert!(fields.contains(&"storage.flush_debounce_ms"));
            }
            other => return Err(format!("unexpected result {:?}", other).into()),
        }
        assert!(!file.path().exists());
        Ok(())
    }

    #[test]
    fn test_upgraded_file_is_rewritten_with_backup() -> TestResult {
        let (_temp_dir, file) = config_file()?;
        let legacy = "[player]\ndefault_speed = 1.25\n[storage]\nflush_debounce_secs = 2\n";
        fs::write(file.path(), legacy)?;

        let config = file.load()?;
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.player.default_rate, 1.25);
        assert_eq!(config.storage.flush_debounce_ms, 2000);

        let rewritten = fs::read_to_string(file.path())?;
        assert!(rewritten.contains("default_rate"));
        assert!(!rewritten.contains("default_speed"));
        assert_eq!(fs::read_to_string(file.backup_path())?, legacy);
        Ok(())
    }

    #[test]
    fn test_upgraded_file_with_bad_values_still_loads() -> TestResult {
        let (_temp_dir, file) = config_file()?;
        fs::write(file.path(), "[player]\ndefault_speed = 9.0\n")?;

        let config = file.load()?;
        assert_eq!(config.player.default_rate, 9.0);
        assert!(config.validate().is_err());
        Ok(())
    }
}
