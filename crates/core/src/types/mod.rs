//! Domain types for audioshelf
//!
//! - `source`: where books and files come from, and the media library seam
//! - `audio_file`: a single playable file
//! - `bookmark`: a saved position inside a file
//! - `collection`: ordered collections with a cursor
//! - `book`: the aggregate root
//! - `common`: formatting helpers

mod audio_file;
mod book;
mod bookmark;
mod collection;
mod common;
mod source;

pub use audio_file::AudioFile;
pub use book::{Book, BookParts, PlayState, PlayableItem, SharedBook, DEFAULT_RATE};
pub use bookmark::Bookmark;
pub use collection::{
    ActiveCollection, AudioFileCollection, BookmarkCollection, CollectionItem, Cursor, PlayMode,
};
pub use common::format_hms;
pub use source::{
    BookLocation, FileLocation, FolderDescriptor, FolderFile, InMemoryMediaLibrary, MediaLibrary,
    PlaylistDescriptor, PlaylistItem, SortType, Source,
};
