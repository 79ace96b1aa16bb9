//! Where books and files come from, and the descriptors scanners produce

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Origin of a book or audio file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// App-managed folder in document storage
    Documents,
    /// Device media library playlist
    MediaLibrary,
}

impl Source {
    /// Integer code used in persisted records
    pub fn code(&self) -> u8 {
        match self {
            Self::Documents => 0,
            Self::MediaLibrary => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Documents),
            1 => Some(Self::MediaLibrary),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Documents => write!(f, "documents"),
            Self::MediaLibrary => write!(f, "media library"),
        }
    }
}

/// Canonical order of a book's audio files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortType {
    /// Declared order (folder path order or playlist order)
    #[default]
    None,
    /// By file name
    Title,
}

impl SortType {
    pub fn code(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Title => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Title),
            _ => None,
        }
    }
}

/// Backing location of a book. Exactly one kind is ever set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BookLocation {
    Folder(PathBuf),
    Playlist(u64),
}

impl BookLocation {
    pub fn source(&self) -> Source {
        match self {
            Self::Folder(_) => Source::Documents,
            Self::Playlist(_) => Source::MediaLibrary,
        }
    }

    /// Stable id string: folder path or playlist persistent id
    pub fn id_string(&self) -> String {
        match self {
            Self::Folder(path) => path.to_string_lossy().into_owned(),
            Self::Playlist(id) => id.to_string(),
        }
    }

    pub fn folder_path(&self) -> Option<&Path> {
        match self {
            Self::Folder(path) => Some(path),
            Self::Playlist(_) => None,
        }
    }

    pub fn playlist_id(&self) -> Option<u64> {
        match self {
            Self::Folder(_) => None,
            Self::Playlist(id) => Some(*id),
        }
    }
}

/// Location of a single audio file. Exactly one kind is ever set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileLocation {
    Path(PathBuf),
    PlaylistItem(u64),
}

impl FileLocation {
    pub fn source(&self) -> Source {
        match self {
            Self::Path(_) => Source::Documents,
            Self::PlaylistItem(_) => Source::MediaLibrary,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::PlaylistItem(_) => None,
        }
    }

    pub fn playlist_item_id(&self) -> Option<u64> {
        match self {
            Self::Path(_) => None,
            Self::PlaylistItem(id) => Some(*id),
        }
    }
}

/// One audio file found by the folder scanner
#[derive(Debug, Clone, PartialEq)]
pub struct FolderFile {
    pub path: PathBuf,
    pub name: String,
    pub duration: f64,
}

/// A scanned folder; only the flattened per-folder file list is consumed
#[derive(Debug, Clone, PartialEq)]
pub struct FolderDescriptor {
    pub path: PathBuf,
    pub title: String,
    pub total_duration: f64,
    pub files: Vec<FolderFile>,
    pub depth: usize,
}

impl FolderDescriptor {
    /// Builds a descriptor whose total is the sum of its files
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>, files: Vec<FolderFile>) -> Self {
        let total_duration = files.iter().map(|f| f.duration).sum();
        Self {
            path: path.into(),
            title: title.into(),
            total_duration,
            files,
            depth: 0,
        }
    }
}

/// One item of a media-library playlist
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistItem {
    pub persistent_id: u64,
    pub name: String,
    pub duration: f64,
}

/// A media-library playlist as read from the device
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistDescriptor {
    pub playlist_persistent_id: u64,
    pub title: String,
    pub total_duration: f64,
    pub files: Vec<PlaylistItem>,
}

impl PlaylistDescriptor {
    pub fn new(persistent_id: u64, title: impl Into<String>, files: Vec<PlaylistItem>) -> Self {
        let total_duration = files.iter().map(|f| f.duration).sum();
        Self {
            playlist_persistent_id: persistent_id,
            title: title.into(),
            total_duration,
            files,
        }
    }
}

/// Read access to the device media library
pub trait MediaLibrary: Send + Sync {
    /// Fetches a playlist by persistent id; `None` if it no longer exists
    fn playlist(&self, playlist_id: u64) -> Option<PlaylistDescriptor>;

    /// Returns a playable asset URL for an item, `None` if unplayable
    fn asset_url(&self, item_id: u64) -> Option<String>;

    fn playlist_exists(&self, playlist_id: u64) -> bool {
        self.playlist(playlist_id).is_some()
    }
}

/// Media library held in memory; used on hosts without a device library
#[derive(Debug, Default)]
pub struct InMemoryMediaLibrary {
    playlists: RwLock<HashMap<u64, PlaylistDescriptor>>,
}

impl InMemoryMediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, playlist: PlaylistDescriptor) {
        self.playlists
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(playlist.playlist_persistent_id, playlist);
    }

    pub fn remove(&self, playlist_id: u64) -> Option<PlaylistDescriptor> {
        self.playlists
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&playlist_id)
    }
}

impl MediaLibrary for InMemoryMediaLibrary {
    fn playlist(&self, playlist_id: u64) -> Option<PlaylistDescriptor> {
        self.playlists
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&playlist_id)
            .cloned()
    }

    fn asset_url(&self, item_id: u64) -> Option<String> {
        let playlists = self.playlists.read().unwrap_or_else(|e| e.into_inner());
        playlists
            .values()
            .flat_map(|p| p.files.iter())
            .find(|item| item.persistent_id == item_id)
            .map(|item| format!("ipod-library://item/item.mp3?id={}", item.persistent_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_codes_roundtrip() {
        for source in [Source::Documents, Source::MediaLibrary] {
            assert_eq!(Source::from_code(source.code()), Some(source));
        }
        assert_eq!(Source::from_code(9), None);
    }

    #[test]
    fn test_sort_type_codes() {
        assert_eq!(SortType::from_code(1), Some(SortType::Title));
        assert_eq!(SortType::from_code(2), None);
        assert_eq!(SortType::default(), SortType::None);
    }

    #[test]
    fn test_book_location() {
        let folder = BookLocation::Folder(PathBuf::from("/docs/1984"));
        assert_eq!(folder.source(), Source::Documents);
        assert_eq!(folder.id_string(), "/docs/1984");
        assert!(folder.playlist_id().is_none());

        let playlist = BookLocation::Playlist(99);
        assert_eq!(playlist.source(), Source::MediaLibrary);
        assert_eq!(playlist.id_string(), "99");
        assert!(playlist.folder_path().is_none());
    }

    #[test]
    fn test_descriptor_totals() {
        let folder = FolderDescriptor::new(
            "/docs/1984",
            "1984",
            vec![
                FolderFile {
                    path: PathBuf::from("/docs/1984/01.mp3"),
                    name: "01".into(),
                    duration: 300.0,
                },
                FolderFile {
                    path: PathBuf::from("/docs/1984/02.mp3"),
                    name: "02".into(),
                    duration: 200.0,
                },
            ],
        );
        assert_eq!(folder.total_duration, 500.0);
    }

    #[test]
    fn test_in_memory_library() {
        let library = InMemoryMediaLibrary::new();
        library.insert(PlaylistDescriptor::new(
            5,
            "Dune",
            vec![PlaylistItem {
                persistent_id: 50,
                name: "Part 1".into(),
                duration: 10.0,
            }],
        ));

        assert!(library.playlist_exists(5));
        assert!(library.asset_url(50).is_some());
        assert!(library.asset_url(51).is_none());

        library.remove(5);
        assert!(!library.playlist_exists(5));
        assert!(library.asset_url(50).is_none());
    }
}
