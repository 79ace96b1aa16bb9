//! Session wiring
//!
//! Builds one session's context, repository and services from the config and
//! owns the periodic validation task.

use crate::error::Result;
use crate::factory::BookFactory;
use crate::mapper::{FolderToBookMapper, PlaylistToBookMapper};
use crate::recovery::MediaLibraryReloader;
use crate::validation::PersistenceValidator;
use audioshelf_config::{Config, ConfigManager};
use audioshelf_core::{
    BookId, DomainContext, FolderDescriptor, MediaLibrary, PlaylistDescriptor, SharedBook,
};
use audioshelf_repository::{next_session_id, BookRepository, RepositorySettings};
use log::info;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// One session's object graph: context, repository and the services on it
pub struct LibraryManager {
    ctx: DomainContext,
    repo: BookRepository,
    factory: BookFactory,
    reloader: MediaLibraryReloader,
    validator: PersistenceValidator,
    validation_interval: Option<Duration>,
    validation_task: Mutex<Option<JoinHandle<()>>>,
}

impl LibraryManager {
    /// Opens the library where `config` puts it
    ///
    /// Must be called inside a tokio runtime.
    pub fn open(
        manager: &ConfigManager,
        config: &Config,
        library: Arc<dyn MediaLibrary>,
    ) -> Result<Self> {
        Self::with_config(manager.books_dir(config), config, library)
    }

    /// Opens the library in `books_dir` with the storage and player sections
    /// of `config`
    pub fn with_config(
        books_dir: PathBuf,
        config: &Config,
        library: Arc<dyn MediaLibrary>,
    ) -> Result<Self> {
        info!("Opening library in {}", books_dir.display());
        let storage = &config.storage;
        let default_rate = config.player.clamp_rate(config.player.default_rate);

        let session = next_session_id(&books_dir);
        let ctx = DomainContext::new(session);

        let settings = RepositorySettings::new(books_dir)
            .with_extension(storage.record_extension.clone())
            .with_flush_debounce(storage.flush_debounce());
        let repo = BookRepository::new(&ctx, settings, Arc::clone(&library))?;

        let reloader = MediaLibraryReloader::new(repo.clone(), library);
        let factory = BookFactory::new(
            repo.clone(),
            FolderToBookMapper::new(repo.clone()).with_default_rate(default_rate),
            PlaylistToBookMapper::new(repo.clone(), reloader.clone())
                .with_default_rate(default_rate),
        );
        let validator = PersistenceValidator::new(repo.clone(), reloader.clone());

        Ok(Self {
            ctx,
            repo,
            factory,
            reloader,
            validator,
            validation_interval: storage.validation_interval(),
            validation_task: Mutex::new(None),
        })
    }

    pub fn context(&self) -> &DomainContext {
        &self.ctx
    }

    pub fn repository(&self) -> &BookRepository {
        &self.repo
    }

    pub fn factory(&self) -> &BookFactory {
        &self.factory
    }

    pub fn reloader(&self) -> &MediaLibraryReloader {
        &self.reloader
    }

    pub fn validator(&self) -> &PersistenceValidator {
        &self.validator
    }

    pub async fn wait_until_ready(&self) {
        self.repo.wait_until_ready().await;
    }

    /// Makes the scanned folders the documents playlist
    pub async fn add_folders(&self, folders: &[FolderDescriptor]) -> Vec<SharedBook> {
        self.factory.create_from_folders(folders).await
    }

    /// Makes the selected playlists the media-library playlist
    pub async fn add_playlists(&self, playlists: &[PlaylistDescriptor]) -> Vec<SharedBook> {
        self.factory.create_from_playlists(playlists).await
    }

    pub fn book(&self, id: &BookId) -> Option<SharedBook> {
        self.repo.read(id)
    }

    /// Starts periodic validation if an interval is configured
    ///
    /// Returns true if a task is running afterwards.
    pub fn start_validation(&self) -> Result<bool> {
        let Some(interval) = self.validation_interval else {
            return Ok(false);
        };
        let mut task = self.validation_task.lock().unwrap_or_else(|e| e.into_inner());
        if task.is_none() {
            *task = Some(self.validator.spawn_periodic(interval)?);
            info!("Validating books every {:?}", interval);
        }
        Ok(true)
    }

    pub fn stop_validation(&self) {
        if let Some(task) = self
            .validation_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }

    /// Stops validation and writes every pending book
    pub async fn shutdown(&self) -> usize {
        self.stop_validation();
        self.repo.flush_now().await
    }
}

impl Drop for LibraryManager {
    fn drop(&mut self) {
        self.stop_validation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audioshelf_config::StorageConfig;
    use audioshelf_core::InMemoryMediaLibrary;
    use tempfile::TempDir;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn open(books_dir: PathBuf, config: &Config) -> Result<LibraryManager> {
        LibraryManager::with_config(books_dir, config, Arc::new(InMemoryMediaLibrary::new()))
    }

    #[tokio::test]
    async fn test_validation_disabled_by_config() -> TestResult {
        let temp_dir = TempDir::new()?;
        let config = Config {
            storage: StorageConfig {
                validation_interval_secs: 0,
                ..StorageConfig::default()
            },
            ..Config::default()
        };
        let manager = open(temp_dir.path().join("books"), &config)?;

        assert!(!manager.start_validation()?);
        Ok(())
    }

    #[tokio::test]
    async fn test_sessions_advance_between_opens() -> TestResult {
        let temp_dir = TempDir::new()?;
        let books_dir = temp_dir.path().join("books");
        let config = Config::default();

        let first = open(books_dir.clone(), &config)?;
        let second = open(books_dir, &config)?;

        assert_eq!(second.context().session(), first.context().session() + 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_start_validation_is_idempotent() -> TestResult {
        let temp_dir = TempDir::new()?;
        let manager = open(temp_dir.path().join("books"), &Config::default())?;
        manager.wait_until_ready().await;

        assert!(manager.start_validation()?);
        assert!(manager.start_validation()?);
        manager.stop_validation();
        Ok(())
    }
}
