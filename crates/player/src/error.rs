use audioshelf_core::{BookId, DomainError, FaultKind, FileLocation};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("No book is loaded")]
    NoBook,

    #[error("Book {0} has nothing to play")]
    NothingToPlay(BookId),

    #[error("Cannot locate '{name}' at {location:?}")]
    Unresolvable { name: String, location: FileLocation },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl PlayerError {
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            Self::Unresolvable { .. } | Self::Engine(_) => FaultKind::Playback,
            Self::NoBook | Self::NothingToPlay(_) | Self::Domain(_) => FaultKind::Usage,
        }
    }
}

pub type PlayerResult<T> = Result<T, PlayerError>;
