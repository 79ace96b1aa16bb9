use audioshelf_core::{BookId, DomainError, FaultKind};
use audioshelf_repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Playlist {0} not found in the media library")]
    PlaylistNotFound(u64),

    #[error("Book {0} is not backed by the media library")]
    NotMediaLibrary(BookId),

    #[error("No tokio runtime is running")]
    NoRuntime,
}

impl LibraryError {
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            Self::Repository(e) => e.fault_kind(),
            Self::Domain(e) => e.fault_kind(),
            Self::PlaylistNotFound(_) | Self::NotMediaLibrary(_) => FaultKind::Validation,
            Self::NoRuntime => FaultKind::Usage,
        }
    }
}

// Both type aliases for convenience
pub type Result<T> = std::result::Result<T, LibraryError>;
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
