//! Cross-checks books against the world they came from
//!
//! A documents book is valid while its folder and current file exist. A
//! media-library book is valid while its playlist exists and its current item
//! is still in it and playable; otherwise it is reloaded first and only marked
//! damaged if that fails too. Damage is state plus an alert, never an error.

use crate::error::{LibraryError, Result};
use crate::recovery::MediaLibraryReloader;
use audioshelf_core::{BookId, BookLocation, FileLocation, SharedBook};
use audioshelf_repository::BookRepository;
use log::{debug, error, info, warn};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Why a book was marked damaged
#[derive(Debug, Clone, PartialEq)]
pub enum DamageReason {
    FolderMissing(PathBuf),
    CurrentFileMissing(PathBuf),
    PlaylistMissing(u64),
    RecoveryFailed { playlist: u64, reason: String },
}

impl fmt::Display for DamageReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FolderMissing(path) => write!(f, "folder {} no longer exists", path.display()),
            Self::CurrentFileMissing(path) => {
                write!(f, "current file {} no longer exists", path.display())
            }
            Self::PlaylistMissing(id) => write!(f, "playlist {} is no longer in the library", id),
            Self::RecoveryFailed { playlist, reason } => {
                write!(f, "reloading playlist {} failed: {}", playlist, reason)
            }
        }
    }
}

/// User-facing notice for a damaged book
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationAlert {
    pub book: BookId,
    pub title: String,
    pub reason: DamageReason,
}

impl fmt::Display for ValidationAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" can't be played: {}", self.title, self.reason)
    }
}

#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Valid,
    /// The book was replaced by one rebuilt from the media library
    Recovered(SharedBook),
    Damaged { alert: ValidationAlert },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Result of validating every book
#[derive(Debug, Default)]
pub struct ValidationSummary {
    pub checked: usize,
    pub recovered: Vec<SharedBook>,
    pub alerts: Vec<ValidationAlert>,
}

/// Book state read under the lock, checked after it is released
struct BookView {
    id: BookId,
    title: String,
    location: BookLocation,
    current: Option<FileLocation>,
    destroyed: bool,
}

impl BookView {
    fn of(book: &SharedBook) -> Self {
        let book = book.lock();
        Self {
            id: book.id().clone(),
            title: book.title().to_string(),
            location: book.location().clone(),
            current: book.current_item().map(|item| item.file.location().clone()),
            destroyed: book.is_destroyed(),
        }
    }

    fn alert(&self, reason: DamageReason) -> ValidationAlert {
        ValidationAlert {
            book: self.id.clone(),
            title: self.title.clone(),
            reason,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PersistenceValidator {
    repo: BookRepository,
    reloader: MediaLibraryReloader,
}

impl PersistenceValidator {
    pub fn new(repo: BookRepository, reloader: MediaLibraryReloader) -> Self {
        Self { repo, reloader }
    }

    /// Validates one book and applies the outcome to it
    ///
    /// Damaged books get `is_damaged` set; a valid book has it cleared.
    pub fn validate(&self, book: &SharedBook) -> ValidationOutcome {
        let view = BookView::of(book);
        if view.destroyed {
            debug!("Skipping removed book {}", view.id);
            return ValidationOutcome::Valid;
        }

        let outcome = match &view.location {
            BookLocation::Folder(folder) => self.check_folder(&view, folder),
            BookLocation::Playlist(playlist_id) => self.check_playlist(book, &view, *playlist_id),
        };

        match &outcome {
            ValidationOutcome::Valid => {
                let mut book = book.lock();
                if book.is_damaged() {
                    info!("Book {} is playable again", view.id);
                    book.set_damaged(false);
                }
            }
            ValidationOutcome::Recovered(_) => {}
            ValidationOutcome::Damaged { alert } => {
                warn!("{}", alert);
                book.lock().set_damaged(true);
            }
        }
        outcome
    }

    fn check_folder(&self, view: &BookView, folder: &std::path::Path) -> ValidationOutcome {
        if !folder.is_dir() {
            return ValidationOutcome::Damaged {
                alert: view.alert(DamageReason::FolderMissing(folder.to_path_buf())),
            };
        }
        match view.current.as_ref().and_then(|location| location.path()) {
            Some(path) if !path.exists() => ValidationOutcome::Damaged {
                alert: view.alert(DamageReason::CurrentFileMissing(path.to_path_buf())),
            },
            _ => ValidationOutcome::Valid,
        }
    }

    fn check_playlist(
        &self,
        book: &SharedBook,
        view: &BookView,
        playlist_id: u64,
    ) -> ValidationOutcome {
        let library = self.reloader.library();
        let Some(playlist) = library.playlist(playlist_id) else {
            return ValidationOutcome::Damaged {
                alert: view.alert(DamageReason::PlaylistMissing(playlist_id)),
            };
        };

        let current = view.current.as_ref().and_then(|location| location.playlist_item_id());
        let reachable = match current {
            Some(item) => {
                playlist.files.iter().any(|f| f.persistent_id == item)
                    && library.asset_url(item).is_some()
            }
            None => playlist.files.is_empty(),
        };
        if reachable {
            return ValidationOutcome::Valid;
        }

        info!("Current item of {} is gone, reloading playlist {}", view.id, playlist_id);
        match self.reloader.reload_with(book, &playlist) {
            Ok(rebuilt) => ValidationOutcome::Recovered(rebuilt),
            Err(e) => ValidationOutcome::Damaged {
                alert: view.alert(DamageReason::RecoveryFailed {
                    playlist: playlist_id,
                    reason: e.to_string(),
                }),
            },
        }
    }

    /// Validates every published book
    pub fn validate_all(&self) -> ValidationSummary {
        let mut summary = ValidationSummary::default();
        for book in self.repo.books() {
            summary.checked += 1;
            match self.validate(&book) {
                ValidationOutcome::Valid => {}
                ValidationOutcome::Recovered(rebuilt) => summary.recovered.push(rebuilt),
                ValidationOutcome::Damaged { alert } => summary.alerts.push(alert),
            }
        }
        debug!(
            "Validated {} book(s): {} recovered, {} damaged",
            summary.checked,
            summary.recovered.len(),
            summary.alerts.len()
        );
        summary
    }

    /// Runs [`validate_all`](Self::validate_all) every `interval` once the
    /// repository is ready
    pub fn spawn_periodic(&self, interval: Duration) -> Result<JoinHandle<()>> {
        let runtime = Handle::try_current().map_err(|_| LibraryError::NoRuntime)?;
        let validator = self.clone();

        Ok(runtime.spawn(async move {
            validator.repo.wait_until_ready().await;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let pass = validator.clone();
                match tokio::task::spawn_blocking(move || pass.validate_all()).await {
                    Ok(summary) if !summary.alerts.is_empty() => {
                        warn!("{} damaged book(s) found", summary.alerts.len());
                    }
                    Ok(_) => {}
                    Err(e) => error!("Validation pass failed: {}", e),
                }
            }
        }))
    }
}
