//! Integration tests for the configuration system

use audioshelf_config::{
    AppConfig, Config, ConfigManager, ConfigSection, LogLevel, PlayerConfig, StorageConfig,
    CONFIG_VERSION,
};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())?;
    Ok((temp_dir, manager))
}

#[test]
fn test_full_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    assert!(manager.initialize()?);

    let config = manager.load()?;
    assert_eq!(config.version, CONFIG_VERSION);

    let mut modified = config.clone();
    modified.player.skip_interval_secs = 30;
    modified.storage.record_extension = "book".into();
    manager.save(&modified)?;

    let reloaded = manager.load()?;
    assert_eq!(reloaded.player.skip_interval_secs, 30);
    assert_eq!(reloaded.storage.record_extension, "book");

    manager.reset()?;
    assert_eq!(manager.load()?, Config::default());

    Ok(())
}

#[test]
fn test_atomic_save_keeps_backup() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let config = Config::default();
    manager.save(&config)?;
    manager.save(&config)?;

    let backup_path = manager.config_path().with_extension("toml.backup");
    assert!(backup_path.exists());
    Ok(())
}

#[test]
fn test_all_sections_default_are_valid() {
    assert!(AppConfig::default().validate().is_ok());
    assert!(PlayerConfig::default().validate().is_ok());
    assert!(StorageConfig::default().validate().is_ok());
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_update_closure() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    manager.initialize()?;

    manager.update(|config| {
        config.app.log_level = LogLevel::Debug;
        config.player.min_rate = 0.75;
        config.storage.validation_interval_secs = 0;
    })?;

    let config = manager.load()?;
    assert_eq!(config.app.log_level, LogLevel::Debug);
    assert_eq!(config.player.clamp_rate(0.5), 0.75);
    assert_eq!(config.storage.validation_interval(), None);
    Ok(())
}

#[test]
fn test_storage_settings_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directories(
        temp_dir.path().join("config"),
        temp_dir.path().join("data"),
    );

    manager.update(|config| {
        config.storage.books_dir_name = "library".into();
        config.storage.flush_debounce_ms = 400;
    })?;

    let config = manager.load()?;
    assert_eq!(
        manager.books_dir(&config),
        temp_dir.path().join("data").join("library")
    );
    assert_eq!(config.storage.flush_debounce(), Duration::from_millis(400));
    Ok(())
}

#[test]
fn test_data_dir_override_persists() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let mut config = Config::default();
    config.app.data_dir = Some(PathBuf::from("/srv/audioshelf"));
    manager.save(&config)?;

    let loaded = manager.load()?;
    assert_eq!(
        manager.books_dir(&loaded),
        PathBuf::from("/srv/audioshelf/books")
    );
    Ok(())
}

#[test]
fn test_serialization_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let original = Config::default();
    let toml_string = toml::to_string(&original)?;
    let deserialized: Config = toml::from_str(&toml_string)?;
    assert_eq!(original, deserialized);
    Ok(())
}

#[test]
fn test_load_save_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    manager.save(&Config::default())?;
    let loaded = manager.load()?;
    manager.save(&loaded)?;
    assert_eq!(loaded, manager.load()?);
    Ok(())
}
