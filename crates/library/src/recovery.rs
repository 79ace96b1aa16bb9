//! Media-library reload
//!
//! When a playlist is edited on the device, the book built from it is
//! replaced wholesale: a new aggregate is built from the current playlist,
//! inherits what it can from the old one, and takes its place in the
//! repository. Holders of the old [`SharedBook`] must re-resolve it by id.

use crate::error::{LibraryError, Result};
use crate::mapper::playlist_files;
use audioshelf_core::{
    AudioFile, Book, BookId, BookLocation, BookParts, Bookmark, MediaLibrary, PlayMode,
    PlaylistDescriptor, SharedBook, SortType,
};
use audioshelf_repository::BookRepository;
use log::{info, warn};
use std::sync::Arc;

/// What a rebuilt book inherits from the one it replaces
struct Carried {
    id: BookId,
    playlist_id: u64,
    sort_type: SortType,
    rate: f32,
    added_to_playlist: bool,
    play_mode: PlayMode,
    cur_index: usize,
    cur_progress: f64,
    marks: Vec<(String, f64, String)>,
}

impl Carried {
    fn take(book: &Book) -> Result<Self> {
        let playlist_id = book
            .location()
            .playlist_id()
            .ok_or_else(|| LibraryError::NotMediaLibrary(book.id().clone()))?;

        Ok(Self {
            id: book.id().clone(),
            playlist_id,
            sort_type: book.sort_type(),
            rate: book.rate(),
            added_to_playlist: book.added_to_playlist(),
            play_mode: book.play_mode(),
            cur_index: book.files().cur_index(),
            cur_progress: book.files().cur_progress(),
            marks: book
                .bookmarks()
                .marks()
                .iter()
                .map(|m| (m.file_name().to_string(), m.time(), m.comment().to_string()))
                .collect(),
        })
    }
}

/// Rebuilds media-library books from the device library
#[derive(Clone)]
pub struct MediaLibraryReloader {
    repo: BookRepository,
    library: Arc<dyn MediaLibrary>,
}

impl MediaLibraryReloader {
    pub fn new(repo: BookRepository, library: Arc<dyn MediaLibrary>) -> Self {
        Self { repo, library }
    }

    pub fn library(&self) -> &Arc<dyn MediaLibrary> {
        &self.library
    }

    /// Re-fetches the book's playlist and replaces the book
    pub fn reload(&self, book: &SharedBook) -> Result<SharedBook> {
        let playlist_id = book
            .lock()
            .location()
            .playlist_id()
            .ok_or_else(|| LibraryError::NotMediaLibrary(book.id().clone()))?;

        let playlist = self
            .library
            .playlist(playlist_id)
            .ok_or(LibraryError::PlaylistNotFound(playlist_id))?;
        self.reload_with(book, &playlist)
    }

    /// Replaces `book` with one built from `playlist`
    ///
    /// Bookmarks move to the new file of the same name; marks whose file is
    /// gone are dropped. The cursor is kept when the new files can still hold
    /// it. If the old record cannot be deleted the old book stays in the
    /// repository untouched and the error is returned. The book must not be
    /// locked by the caller.
    pub fn reload_with(
        &self,
        book: &SharedBook,
        playlist: &PlaylistDescriptor,
    ) -> Result<SharedBook> {
        let carried = Carried::take(&book.lock())?;
        if carried.playlist_id != playlist.playlist_persistent_id {
            return Err(LibraryError::PlaylistNotFound(carried.playlist_id));
        }

        let ctx = self.repo.context();
        let mut files = playlist_files(ctx, playlist);
        if carried.sort_type == SortType::Title {
            files.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.index().cmp(&b.index())));
        }

        let bookmarks = remap_bookmarks(ctx, &carried, &files);
        let (cur_file_index, cur_file_progress) = carry_cursor(&carried, &files);

        let mut rebuilt = Book::restore(
            ctx,
            BookParts {
                uid: ctx.next_uid(),
                location: BookLocation::Playlist(playlist.playlist_persistent_id),
                title: playlist.title.clone(),
                sort_type: carried.sort_type,
                added_to_playlist: carried.added_to_playlist,
                rate: carried.rate,
                is_damaged: false,
                files,
                bookmarks,
                cur_file_index,
                cur_file_progress,
            },
        );
        rebuilt.set_play_mode(carried.play_mode);
        let rebuilt = SharedBook::new(rebuilt);

        self.repo.remove(&carried.id)?;
        self.repo.write(std::slice::from_ref(&rebuilt));

        info!(
            "Reloaded book {} from playlist {} ({} files)",
            carried.id,
            playlist.playlist_persistent_id,
            playlist.files.len()
        );
        Ok(rebuilt)
    }
}

impl std::fmt::Debug for MediaLibraryReloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLibraryReloader")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

fn remap_bookmarks(
    ctx: &audioshelf_core::DomainContext,
    carried: &Carried,
    files: &[AudioFile],
) -> Vec<Bookmark> {
    carried
        .marks
        .iter()
        .filter_map(|(file_name, time, comment)| {
            match files.iter().find(|f| f.name() == file_name) {
                Some(file) => Some(Bookmark::new(ctx.next_uid(), file, *time, comment.clone())),
                None => {
                    warn!(
                        "Dropping bookmark at {:.1}s on '{}' of {}: file no longer in playlist",
                        time, file_name, carried.id
                    );
                    None
                }
            }
        })
        .collect()
}

fn carry_cursor(carried: &Carried, files: &[AudioFile]) -> (usize, f64) {
    match files.get(carried.cur_index) {
        Some(file) if file.duration() >= carried.cur_progress => {
            (carried.cur_index, carried.cur_progress)
        }
        Some(_) => (carried.cur_index, 0.0),
        None => (0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audioshelf_core::{DomainContext, PlaylistItem};

    fn carried(cur_index: usize, cur_progress: f64) -> Carried {
        Carried {
            id: BookId::new("9"),
            playlist_id: 9,
            sort_type: SortType::None,
            rate: 1.0,
            added_to_playlist: true,
            play_mode: PlayMode::AudioFile,
            cur_index,
            cur_progress,
            marks: vec![
                ("a".into(), 3.0, "keep".into()),
                ("gone".into(), 1.0, "drop".into()),
            ],
        }
    }

    fn files(ctx: &DomainContext) -> Vec<AudioFile> {
        let playlist = PlaylistDescriptor::new(
            9,
            "P",
            vec![
                PlaylistItem {
                    persistent_id: 1,
                    name: "a".into(),
                    duration: 10.0,
                },
                PlaylistItem {
                    persistent_id: 2,
                    name: "b".into(),
                    duration: 4.0,
                },
            ],
        );
        playlist_files(ctx, &playlist)
    }

    #[test]
    fn test_cursor_carried_when_it_fits() {
        let ctx = DomainContext::new(1);
        assert_eq!(carry_cursor(&carried(1, 3.5), &files(&ctx)), (1, 3.5));
    }

    #[test]
    fn test_progress_dropped_when_file_is_shorter() {
        let ctx = DomainContext::new(1);
        assert_eq!(carry_cursor(&carried(1, 8.0), &files(&ctx)), (1, 0.0));
    }

    #[test]
    fn test_cursor_reset_when_index_is_gone() {
        let ctx = DomainContext::new(1);
        assert_eq!(carry_cursor(&carried(5, 1.0), &files(&ctx)), (0, 0.0));
    }

    #[test]
    fn test_bookmarks_follow_file_name() {
        let ctx = DomainContext::new(1);
        let files = files(&ctx);
        let marks = remap_bookmarks(&ctx, &carried(0, 0.0), &files);

        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].file_uid(), files[0].uid());
        assert_eq!(marks[0].comment(), "keep");
        assert_eq!(marks[0].time(), 3.0);
    }
}
