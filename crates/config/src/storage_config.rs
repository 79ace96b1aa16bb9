//! Book storage configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where and how book records are stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory name under the data directory
    pub books_dir_name: String,

    /// Record file extension, without the dot
    pub record_extension: String,

    /// Delay between the first change and the write that stores it
    pub flush_debounce_ms: u64,

    /// Seconds between background validation passes; 0 disables them
    pub validation_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            books_dir_name: "books".to_string(),
            record_extension: "json".to_string(),
            flush_debounce_ms: 1000,
            validation_interval_secs: 300,
        }
    }
}

impl StorageConfig {
    pub fn books_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.books_dir_name)
    }

    pub fn flush_debounce(&self) -> Duration {
        Duration::from_millis(self.flush_debounce_ms)
    }

    /// `None` when periodic validation is disabled
    pub fn validation_interval(&self) -> Option<Duration> {
        (self.validation_interval_secs > 0)
            .then(|| Duration::from_secs(self.validation_interval_secs))
    }
}

impl ConfigSection for StorageConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::file_name(&self.books_dir_name, "storage.books_dir_name"),
            Validator::file_name(&self.record_extension, "storage.record_extension"),
            Validator::in_range(self.flush_debounce_ms, 10, 60_000, "storage.flush_debounce_ms"),
            Validator::in_range(
                self.validation_interval_secs,
                0,
                86_400,
                "storage.validation_interval_secs",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.books_dir_name = other.books_dir_name;
        self.record_extension = other.record_extension;
        self.flush_debounce_ms = other.flush_debounce_ms;
        self.validation_interval_secs = other.validation_interval_secs;
    }

    fn section_name(&self) -> &'static str {
        "storage"
    }
}
