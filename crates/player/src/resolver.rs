use audioshelf_core::{AudioFile, FileLocation, MediaLibrary};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Something the engine can open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaLocation {
    File(PathBuf),
    /// Media-library asset URL
    Asset(String),
}

impl fmt::Display for MediaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Asset(url) => write!(f, "{}", url),
        }
    }
}

/// Maps audio files to engine locations
#[derive(Clone)]
pub struct LocationResolver {
    library: Arc<dyn MediaLibrary>,
}

impl LocationResolver {
    pub fn new(library: Arc<dyn MediaLibrary>) -> Self {
        Self { library }
    }

    /// `None` if the file is gone or the library cannot play the item
    pub fn resolve(&self, file: &AudioFile) -> Option<MediaLocation> {
        match file.location() {
            FileLocation::Path(path) => path.is_file().then(|| MediaLocation::File(path.clone())),
            FileLocation::PlaylistItem(item) => {
                self.library.asset_url(*item).map(MediaLocation::Asset)
            }
        }
    }
}

impl fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audioshelf_core::{InMemoryMediaLibrary, PlaylistDescriptor, PlaylistItem, Uid};
    use tempfile::TempDir;

    #[test]
    fn test_resolves_existing_file_only() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("01.mp3");
        std::fs::write(&path, b"ID3")?;
        let resolver = LocationResolver::new(Arc::new(InMemoryMediaLibrary::new()));

        let present = AudioFile::from_path(Uid::new(1, 1), path.clone(), "01", 10.0, 0);
        assert_eq!(resolver.resolve(&present), Some(MediaLocation::File(path)));

        let missing =
            AudioFile::from_path(Uid::new(1, 2), temp_dir.path().join("02.mp3"), "02", 10.0, 1);
        assert_eq!(resolver.resolve(&missing), None);
        Ok(())
    }

    #[test]
    fn test_resolves_library_item_through_asset_url() {
        let library = Arc::new(InMemoryMediaLibrary::new());
        library.insert(PlaylistDescriptor::new(
            1,
            "P",
            vec![PlaylistItem {
                persistent_id: 42,
                name: "a".into(),
                duration: 5.0,
            }],
        ));
        let resolver = LocationResolver::new(library);

        let known = AudioFile::from_playlist_item(Uid::new(1, 1), 42, "a", 5.0, 0);
        assert!(matches!(resolver.resolve(&known), Some(MediaLocation::Asset(_))));

        let unknown = AudioFile::from_playlist_item(Uid::new(1, 2), 43, "b", 5.0, 1);
        assert_eq!(resolver.resolve(&unknown), None);
    }
}
