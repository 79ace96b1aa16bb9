//! Configuration migration system
//!
//! Migrations run on the raw TOML table before it is deserialized, so fields
//! that no longer exist in [`Config`](crate::Config) can still be carried
//! forward.

use crate::{ConfigError, ConfigResult, CONFIG_VERSION};
use toml::Table;

/// One step of the upgrade chain
pub trait Migration {
    /// Returns the version this migration upgrades TO
    fn target_version(&self) -> u32;

    fn migrate(&self, table: &mut Table) -> ConfigResult<()>;
}

/// Reads the `version` key; files without one predate versioning
pub fn file_version(table: &Table) -> u32 {
    table
        .get("version")
        .and_then(|v| v.as_integer())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(1)
}

/// Upgrade steps, oldest first
const STEPS: &[&dyn Migration] = &[&RateKeys];

/// Upgrades `table` in place to [`CONFIG_VERSION`]
///
/// Returns true if anything was migrated. Newer files are left alone.
pub fn migrate_to_latest(table: &mut Table) -> ConfigResult<bool> {
    let version = file_version(table);
    if version > CONFIG_VERSION {
        log::warn!(
            "Config version {} is newer than {}; reading it as-is",
            version,
            CONFIG_VERSION
        );
        return Ok(false);
    }
    if version == CONFIG_VERSION {
        return Ok(false);
    }

    for step in STEPS.iter().filter(|step| step.target_version() > version) {
        step.migrate(table)?;
        log::info!("Upgraded config to version {}", step.target_version());
    }
    table.insert(
        "version".to_string(),
        toml::Value::Integer(i64::from(CONFIG_VERSION)),
    );
    Ok(true)
}

/// Version 2 renamed the speed settings to rates and switched the flush
/// delay from seconds to milliseconds
struct RateKeys;

impl Migration for RateKeys {
    fn target_version(&self) -> u32 {
        2
    }

    fn migrate(&self, table: &mut Table) -> ConfigResult<()> {
        if let Some(player) = section(table, "player", 1)? {
            rename(player, "default_speed", "default_rate");
            rename(player, "speed_step", "rate_step");
        }

        if let Some(storage) = section(table, "storage", 1)? {
            if let Some(secs) = storage.remove("flush_debounce_secs") {
                let secs = secs
                    .as_float()
                    .or_else(|| secs.as_integer().map(|i| i as f64))
                    .ok_or_else(|| ConfigError::Migration {
                        from: 1,
                        reason: "storage.flush_debounce_secs is not a number".into(),
                    })?;
                let ms = (secs * 1000.0).round().max(0.0) as i64;
                storage.insert("flush_debounce_ms".to_string(), toml::Value::Integer(ms));
            }
        }
        Ok(())
    }
}

fn section<'a>(
    table: &'a mut Table,
    name: &str,
    from: u32,
) -> ConfigResult<Option<&'a mut Table>> {
    match table.get_mut(name) {
        None => Ok(None),
        Some(value) => value
            .as_table_mut()
            .map(Some)
            .ok_or_else(|| ConfigError::Migration {
                from,
                reason: format!("{} is not a table", name),
            }),
    }
}

fn rename(table: &mut Table, old: &str, new: &str) {
    if let Some(value) = table.remove(old) {
        if !table.contains_key(new) {
            table.insert(new.to_string(), value);
        }
    }
}
