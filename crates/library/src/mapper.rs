//! Scanned folders and playlists to books
//!
//! Both mappers reuse the aggregate the repository already holds for an id,
//! so repeated scans never mint new uids for known books.

use crate::recovery::MediaLibraryReloader;
use audioshelf_core::{
    AudioFile, Book, BookId, BookLocation, DomainContext, FolderDescriptor, PlaylistDescriptor,
    SharedBook, DEFAULT_RATE,
};
use audioshelf_repository::BookRepository;
use log::{debug, info, warn};

/// Total durations closer than this are considered equal
pub const DURATION_TOLERANCE: f64 = 0.5;

/// Builds documents books from scanned folders
#[derive(Debug, Clone)]
pub struct FolderToBookMapper {
    repo: BookRepository,
    default_rate: f32,
}

impl FolderToBookMapper {
    pub fn new(repo: BookRepository) -> Self {
        Self {
            repo,
            default_rate: DEFAULT_RATE,
        }
    }

    /// Rate given to books this mapper creates
    pub fn with_default_rate(mut self, rate: f32) -> Self {
        self.default_rate = rate;
        self
    }

    /// Converts each folder, reusing known books
    ///
    /// Folders without files are skipped.
    pub fn convert(&self, folders: &[FolderDescriptor]) -> Vec<SharedBook> {
        folders
            .iter()
            .filter_map(|folder| {
                let id = BookId::new(BookLocation::Folder(folder.path.clone()).id_string());
                if let Some(book) = self.repo.read(&id) {
                    return Some(book);
                }
                if folder.files.is_empty() {
                    debug!("Skipping empty folder {}", folder.path.display());
                    return None;
                }
                let book = folder_book(self.repo.context(), folder).with_rate(self.default_rate);
                Some(SharedBook::new(book))
            })
            .collect()
    }
}

/// Builds a fresh book whose files are sorted by path
pub fn folder_book(ctx: &DomainContext, folder: &FolderDescriptor) -> Book {
    let mut entries: Vec<_> = folder.files.iter().collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    let files = entries
        .into_iter()
        .enumerate()
        .map(|(index, file)| {
            AudioFile::from_path(
                ctx.next_uid(),
                file.path.clone(),
                file.name.clone(),
                file.duration,
                index,
            )
        })
        .collect();

    Book::from_folder(ctx, folder.path.clone(), folder.title.clone(), files)
}

/// Media-library files in playlist order
pub fn playlist_files(ctx: &DomainContext, playlist: &PlaylistDescriptor) -> Vec<AudioFile> {
    playlist
        .files
        .iter()
        .enumerate()
        .map(|(index, item)| {
            AudioFile::from_playlist_item(
                ctx.next_uid(),
                item.persistent_id,
                item.name.clone(),
                item.duration,
                index,
            )
        })
        .collect()
}

/// Builds media-library books from playlists
///
/// A known book whose file count or total duration no longer matches the
/// playlist was edited externally and is rebuilt through the reloader.
#[derive(Debug, Clone)]
pub struct PlaylistToBookMapper {
    repo: BookRepository,
    reloader: MediaLibraryReloader,
    default_rate: f32,
}

impl PlaylistToBookMapper {
    pub fn new(repo: BookRepository, reloader: MediaLibraryReloader) -> Self {
        Self {
            repo,
            reloader,
            default_rate: DEFAULT_RATE,
        }
    }

    /// Rate given to books this mapper creates; rebuilt books keep theirs
    pub fn with_default_rate(mut self, rate: f32) -> Self {
        self.default_rate = rate;
        self
    }

    pub fn convert(&self, playlists: &[PlaylistDescriptor]) -> Vec<SharedBook> {
        playlists
            .iter()
            .filter_map(|playlist| self.convert_one(playlist))
            .collect()
    }

    fn convert_one(&self, playlist: &PlaylistDescriptor) -> Option<SharedBook> {
        let id = BookId::new(BookLocation::Playlist(playlist.playlist_persistent_id).id_string());

        if let Some(existing) = self.repo.read(&id) {
            let (count, total) = {
                let book = existing.lock();
                (book.files().count(), book.total_duration())
            };
            let changed = count != playlist.files.len()
                || (total - playlist.total_duration).abs() > DURATION_TOLERANCE;
            if !changed {
                return Some(existing);
            }

            info!(
                "Playlist {} changed ({} -> {} files), rebuilding book",
                playlist.playlist_persistent_id,
                count,
                playlist.files.len()
            );
            return match self.reloader.reload_with(&existing, playlist) {
                Ok(rebuilt) => Some(rebuilt),
                Err(e) => {
                    warn!("Keeping stale book {}: {}", id, e);
                    Some(existing)
                }
            };
        }

        if playlist.files.is_empty() {
            debug!("Skipping empty playlist {}", playlist.playlist_persistent_id);
            return None;
        }

        let ctx = self.repo.context();
        let files = playlist_files(ctx, playlist);
        let book = Book::from_playlist(
            ctx,
            playlist.playlist_persistent_id,
            playlist.title.clone(),
            files,
        )
        .with_rate(self.default_rate);
        Some(SharedBook::new(book))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audioshelf_core::{FolderFile, PlaylistItem};

    #[test]
    fn test_folder_book_sorts_by_path() {
        let ctx = DomainContext::new(1);
        let folder = FolderDescriptor::new(
            "/books/1984",
            "1984",
            vec![
                FolderFile {
                    path: "/books/1984/02.mp3".into(),
                    name: "02".into(),
                    duration: 200.0,
                },
                FolderFile {
                    path: "/books/1984/01.mp3".into(),
                    name: "01".into(),
                    duration: 300.0,
                },
            ],
        );

        let book = folder_book(&ctx, &folder);
        let names: Vec<_> = book.files().files().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["01", "02"]);
        let indices: Vec<_> = book.files().files().iter().map(|f| f.index()).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(book.total_duration(), 500.0);
        assert!(book.added_to_playlist());
    }

    #[test]
    fn test_playlist_files_keep_playlist_order() {
        let ctx = DomainContext::new(1);
        let playlist = PlaylistDescriptor::new(
            7,
            "Dune",
            vec![
                PlaylistItem {
                    persistent_id: 30,
                    name: "b".into(),
                    duration: 10.0,
                },
                PlaylistItem {
                    persistent_id: 20,
                    name: "a".into(),
                    duration: 5.0,
                },
            ],
        );

        let files = playlist_files(&ctx, &playlist);
        assert_eq!(files[0].id(), "30");
        assert_eq!(files[1].index(), 1);
        assert_eq!(files[1].location().playlist_item_id(), Some(20));
    }
}
