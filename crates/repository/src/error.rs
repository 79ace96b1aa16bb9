//! Error types for the book repository

use audioshelf_core::{DomainError, FaultKind};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// A persisted book record could not be turned back into a book
///
/// Every variant is a reason to prune the record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Book {uid} has both folderPath and playlistID")]
    BookLocationConflict { uid: String },

    #[error("Book {uid} has neither folderPath nor playlistID")]
    BookLocationMissing { uid: String },

    #[error("File {uid} has both path and playlistID")]
    FileLocationConflict { uid: String },

    #[error("File {uid} has neither path nor playlistID")]
    FileLocationMissing { uid: String },

    #[error("Bookmark {bookmark} references unknown file {file}")]
    DanglingFileRef { bookmark: String, file: String },

    #[error("Unknown source code {0}")]
    UnknownSource(u8),

    #[error("Unknown sort type code {0}")]
    UnknownSortType(u8),

    #[error("Source code {code} does not match the location of {uid}")]
    SourceMismatch { uid: String, code: u8 },

    #[error(transparent)]
    InvalidUid(#[from] DomainError),
}

/// Errors raised by the record store and repository
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Failed to create the books directory
    #[error("Failed to create books directory at {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read record at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write record at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to delete record at {path}: {source}")]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Record was read but could not be decoded
    #[error("Invalid record at {path}: {source}")]
    Record { path: PathBuf, source: RecordError },

    /// The repository was created outside a tokio runtime
    #[error("Book repository requires a tokio runtime")]
    NoRuntime,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepositoryError {
    /// Directory, read, write and delete failures
    pub fn is_storage_fault(&self) -> bool {
        matches!(
            self,
            Self::DirectoryCreation { .. }
                | Self::Read { .. }
                | Self::Write { .. }
                | Self::Delete { .. }
                | Self::Io(_)
        )
    }

    /// The record itself is bad and should be pruned
    pub fn is_record_fault(&self) -> bool {
        matches!(self, Self::Record { .. } | Self::Serialize(_))
    }

    pub fn fault_kind(&self) -> FaultKind {
        if self.is_record_fault() {
            FaultKind::Deserialization
        } else if self.is_storage_fault() {
            FaultKind::Storage
        } else {
            FaultKind::Usage
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audioshelf_core::RecoveryAction;

    #[test]
    fn test_fault_classification() {
        let write = RepositoryError::Write {
            path: PathBuf::from("/tmp/x.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(write.is_storage_fault());
        assert!(!write.is_record_fault());
        assert_eq!(
            write.fault_kind().recovery_action(),
            RecoveryAction::KeepInMemory
        );

        let record = RepositoryError::Record {
            path: PathBuf::from("/tmp/y.json"),
            source: RecordError::UnknownSource(9),
        };
        assert!(record.is_record_fault());
        assert_eq!(
            record.fault_kind().recovery_action(),
            RecoveryAction::PruneRecord
        );
    }

    #[test]
    fn test_record_error_display() {
        let err = RecordError::DanglingFileRef {
            bookmark: "1-4".into(),
            file: "1-9".into(),
        };
        assert_eq!(err.to_string(), "Bookmark 1-4 references unknown file 1-9");
    }
}
