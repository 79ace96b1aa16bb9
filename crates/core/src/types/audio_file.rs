//! Audio file domain model

use crate::ids::Uid;
use crate::types::source::{FileLocation, Source};
use std::path::PathBuf;

/// One playable track of a book
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFile {
    uid: Uid,
    id: String,
    location: FileLocation,
    name: String,
    duration: f64,
    index: usize,
    /// Owning book; a non-owning back reference set on attachment
    book: Option<Uid>,
}

impl AudioFile {
    /// Creates a documents-sourced file; its id is the path
    pub fn from_path(
        uid: Uid,
        path: PathBuf,
        name: impl Into<String>,
        duration: f64,
        index: usize,
    ) -> Self {
        Self {
            uid,
            id: path.to_string_lossy().into_owned(),
            location: FileLocation::Path(path),
            name: name.into(),
            duration: sanitize_duration(duration),
            index,
            book: None,
        }
    }

    /// Creates a media-library file; its id is the item persistent id
    pub fn from_playlist_item(
        uid: Uid,
        item_id: u64,
        name: impl Into<String>,
        duration: f64,
        index: usize,
    ) -> Self {
        Self {
            uid,
            id: item_id.to_string(),
            location: FileLocation::PlaylistItem(item_id),
            name: name.into(),
            duration: sanitize_duration(duration),
            index,
            book: None,
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> Source {
        self.location.source()
    }

    pub fn location(&self) -> &FileLocation {
        &self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Ordinal in the declared order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn book(&self) -> Option<Uid> {
        self.book
    }

    pub(crate) fn attach(&mut self, book: Uid) {
        self.book = Some(book);
    }
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_file() {
        let file = AudioFile::from_path(
            Uid::new(1, 1),
            PathBuf::from("/docs/1984/01.mp3"),
            "01",
            300.0,
            0,
        );
        assert_eq!(file.id(), "/docs/1984/01.mp3");
        assert_eq!(file.source(), Source::Documents);
        assert!(file.location().playlist_item_id().is_none());
        assert!(file.book().is_none());
    }

    #[test]
    fn test_playlist_file() {
        let file = AudioFile::from_playlist_item(Uid::new(1, 2), 77, "Part 1", 12.5, 3);
        assert_eq!(file.id(), "77");
        assert_eq!(file.source(), Source::MediaLibrary);
        assert_eq!(file.location().playlist_item_id(), Some(77));
        assert_eq!(file.index(), 3);
    }

    #[test]
    fn test_negative_duration_is_clamped() {
        let file = AudioFile::from_playlist_item(Uid::new(1, 3), 1, "x", -4.0, 0);
        assert_eq!(file.duration(), 0.0);
        let file = AudioFile::from_playlist_item(Uid::new(1, 4), 1, "x", f64::NAN, 0);
        assert_eq!(file.duration(), 0.0);
    }
}
