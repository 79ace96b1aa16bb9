//! On-disk record store
//!
//! One file per book under the books directory, named `<uid>.<ext>`.
//! Writes go through a temp file in the same directory and an atomic rename,
//! so a record is never observed half-written.

use crate::error::{RepositoryError, RepositoryResult};
use crate::record::BookRecord;
use audioshelf_core::Uid;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Handles book record files
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
    extension: String,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the books directory if it does not exist
    pub fn ensure_dir(&self) -> RepositoryResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| RepositoryError::DirectoryCreation {
                path: self.dir.clone(),
                source: e,
            })?;
            log::info!("Created books directory: {}", self.dir.display());
        }
        Ok(())
    }

    pub fn path_for(&self, uid: Uid) -> PathBuf {
        self.dir.join(format!("{}.{}", uid, self.extension))
    }

    /// Lists every record file, sorted by path
    pub fn list(&self) -> RepositoryResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| RepositoryError::Read {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    pub fn read(&self, path: &Path) -> RepositoryResult<Vec<u8>> {
        fs::read(path).map_err(|e| RepositoryError::Read {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reads and decodes the record at `path`
    pub fn read_record(&self, path: &Path) -> RepositoryResult<BookRecord> {
        let bytes = self.read(path)?;
        BookRecord::from_bytes(&bytes).map_err(|e| RepositoryError::Record {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Writes `record` atomically under its uid
    pub fn write_record(&self, uid: Uid, record: &BookRecord) -> RepositoryResult<()> {
        let bytes = record.to_bytes().map_err(RepositoryError::Serialize)?;
        let path = self.path_for(uid);
        self.write_atomic(&path, &bytes)?;
        log::debug!("Stored record {}", path.display());
        Ok(())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> RepositoryResult<()> {
        let write_err = |e: std::io::Error| RepositoryError::Write {
            path: path.to_path_buf(),
            source: e,
        };

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        temp_file.write_all(bytes).map_err(write_err)?;
        temp_file.flush().map_err(write_err)?;
        temp_file.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Deletes the record for `uid`. A missing record is not an error.
    pub fn delete(&self, uid: Uid) -> RepositoryResult<()> {
        self.delete_path(&self.path_for(uid))
    }

    pub fn delete_path(&self, path: &Path) -> RepositoryResult<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                log::debug!("Deleted record {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepositoryError::Delete {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}
