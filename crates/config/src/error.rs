//! Config errors
//!
//! [`ConfigError`] covers the config file's life cycle: locating it, reading,
//! upgrading, checking and writing it back. [`ValidationError`] names one bad
//! field; a file can have several.

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform has no per-user config directory
    #[error("No user config directory on this platform")]
    NoConfigDirectory,

    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file exists but holds nothing but whitespace
    #[error("{} is empty", .path.display())]
    Empty { path: PathBuf },

    #[error("Cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Cannot upgrade config from version {from}: {reason}")]
    Migration { from: u32, reason: String },

    /// Refused to save a config with bad fields
    #[error("Invalid config: {}", summarize(.0))]
    Invalid(Vec<ValidationError>),

    #[error("Cannot encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    /// Creating the directory, the backup or the file itself failed
    #[error("Cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// One config field with an unusable value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path, e.g. `storage.flush_debounce_ms`
    pub field: String,
    pub problem: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }

    /// Appends the offending value to `problem`
    pub fn with_value(
        field: impl Into<String>,
        problem: impl Into<String>,
        value: impl std::fmt::Display,
    ) -> Self {
        Self {
            field: field.into(),
            problem: format!("{} (got {})", problem.into(), value),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

impl std::error::Error for ValidationError {}
