//! Domain model for audioshelf
//!
//! Books, their audio files and bookmarks, cursor-bearing collections and the
//! session-wide event dispatcher. Persistence, source mapping and playback
//! live in sibling crates and only talk to books through this API.

pub mod context;
pub mod error;
pub mod events;
pub mod ids;
pub mod types;

// Re-export commonly used types
pub use context::DomainContext;
pub use error::{DomainError, FaultKind, RecoveryAction, Result};
pub use events::{BookRef, Dispatcher, DomainEvent, EventLog, SubscriptionId};
pub use ids::{BookId, Uid, UidGenerator};
pub use types::{
    AudioFile, Book, BookLocation, BookParts, Bookmark, FileLocation, FolderDescriptor,
    FolderFile, InMemoryMediaLibrary, MediaLibrary, PlayMode, PlayState, PlayableItem,
    PlaylistDescriptor, PlaylistItem, SharedBook, SortType, Source, DEFAULT_RATE,
};
