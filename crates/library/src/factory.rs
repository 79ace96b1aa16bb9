//! Scan results to playlist
//!
//! The factory is the only way scanner output reaches the repository. It waits
//! for stored books to load so a scan reuses them instead of minting
//! replacements.

use crate::mapper::{FolderToBookMapper, PlaylistToBookMapper};
use audioshelf_core::{BookId, FolderDescriptor, PlaylistDescriptor, SharedBook, Source};
use audioshelf_repository::BookRepository;
use log::{debug, info};
use std::collections::HashSet;

/// Turns a scan result into the playlist
///
/// Books of the same source that are missing from the scan stay in the
/// repository but leave the playlist; books in the scan join it.
#[derive(Debug, Clone)]
pub struct BookFactory {
    repo: BookRepository,
    folders: FolderToBookMapper,
    playlists: PlaylistToBookMapper,
}

impl BookFactory {
    pub fn new(
        repo: BookRepository,
        folders: FolderToBookMapper,
        playlists: PlaylistToBookMapper,
    ) -> Self {
        Self {
            repo,
            folders,
            playlists,
        }
    }

    pub async fn create_from_folders(&self, folders: &[FolderDescriptor]) -> Vec<SharedBook> {
        self.wait_for_stored_books().await;
        let books = self.folders.convert(folders);
        self.reconcile(Source::Documents, &books);
        books
    }

    pub async fn create_from_playlists(&self, playlists: &[PlaylistDescriptor]) -> Vec<SharedBook> {
        self.wait_for_stored_books().await;
        let books = self.playlists.convert(playlists);
        self.reconcile(Source::MediaLibrary, &books);
        books
    }

    async fn wait_for_stored_books(&self) {
        if !self.repo.is_ready() {
            debug!("Scan arrived while loading; waiting for stored books");
            self.repo.wait_until_ready().await;
        }
    }

    fn reconcile(&self, source: Source, books: &[SharedBook]) {
        let selected: HashSet<&BookId> = books.iter().map(|b| b.id()).collect();

        let mut removed = 0;
        for book in self.repo.books_of_source(source) {
            if !selected.contains(book.id()) {
                let mut book = book.lock();
                if book.added_to_playlist() {
                    book.set_added_to_playlist(false);
                    removed += 1;
                }
            }
        }

        for book in books {
            book.lock().set_added_to_playlist(true);
        }

        let added = self.repo.write(books);
        info!(
            "Playlist from {}: {} book(s), {} new, {} removed",
            source,
            books.len(),
            added,
            removed
        );
    }
}
