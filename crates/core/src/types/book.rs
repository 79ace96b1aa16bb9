//! Book aggregate
//!
//! A [`Book`] exclusively owns its audio files and bookmarks. Setters that
//! change persisted state publish domain events; those events are the only
//! thing that triggers persistence. Construction and restoration publish
//! nothing.

use crate::context::DomainContext;
use crate::error::{DomainError, Result};
use crate::events::{BookRef, DomainEvent};
use crate::ids::{BookId, Uid};
use crate::types::audio_file::AudioFile;
use crate::types::bookmark::Bookmark;
use crate::types::collection::{
    ActiveCollection, AudioFileCollection, BookmarkCollection, Cursor, PlayMode,
};
use crate::types::source::{BookLocation, SortType, Source};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Playback state of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Paused,
    Playing,
}

/// Default playback rate
pub const DEFAULT_RATE: f32 = 1.0;

/// Everything needed to rebuild a book from storage
#[derive(Debug, Clone)]
pub struct BookParts {
    pub uid: Uid,
    pub location: BookLocation,
    pub title: String,
    pub sort_type: SortType,
    pub added_to_playlist: bool,
    pub rate: f32,
    pub is_damaged: bool,
    /// Files in their stored (already sorted) order
    pub files: Vec<AudioFile>,
    pub bookmarks: Vec<Bookmark>,
    pub cur_file_index: usize,
    pub cur_file_progress: f64,
}

/// The item the player should load for a book
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayableItem<'a> {
    pub file: &'a AudioFile,
    /// Offset into the file where the item begins
    pub start: f64,
    /// Length of the item from `start`
    pub duration: f64,
    /// Seconds into the item
    pub progress: f64,
}

impl PlayableItem<'_> {
    pub fn is_finished(&self) -> bool {
        self.progress >= self.duration
    }
}

#[derive(Debug)]
pub struct Book {
    ctx: DomainContext,
    uid: Uid,
    id: BookId,
    location: BookLocation,
    title: String,
    total_duration: f64,
    play_state: PlayState,
    rate: f32,
    is_damaged: bool,
    added_to_playlist: bool,
    play_mode: PlayMode,
    sort_type: SortType,
    destroyed: bool,
    files: AudioFileCollection,
    bookmarks: BookmarkCollection,
    /// Seconds elapsed before the file at each position
    elapsed_at: Vec<f64>,
}

impl Book {
    /// Creates a new book. New books are added to the playlist.
    pub fn new(
        ctx: &DomainContext,
        location: BookLocation,
        title: impl Into<String>,
        files: Vec<AudioFile>,
    ) -> Self {
        let uid = ctx.next_uid();
        Self::assemble(ctx, uid, location, title.into(), files, Vec::new())
    }

    /// Starts a new book at `rate` instead of [`DEFAULT_RATE`]
    ///
    /// Invalid rates are ignored. Nothing is published; the book is not
    /// registered anywhere yet.
    pub fn with_rate(mut self, rate: f32) -> Self {
        if rate.is_finite() && rate > 0.0 {
            self.rate = rate;
        }
        self
    }

    pub fn from_folder(
        ctx: &DomainContext,
        path: impl Into<PathBuf>,
        title: impl Into<String>,
        files: Vec<AudioFile>,
    ) -> Self {
        Self::new(ctx, BookLocation::Folder(path.into()), title, files)
    }

    pub fn from_playlist(
        ctx: &DomainContext,
        playlist_id: u64,
        title: impl Into<String>,
        files: Vec<AudioFile>,
    ) -> Self {
        Self::new(ctx, BookLocation::Playlist(playlist_id), title, files)
    }

    /// Rebuilds a persisted book without publishing anything
    pub fn restore(ctx: &DomainContext, parts: BookParts) -> Self {
        let mut book = Self::assemble(
            ctx,
            parts.uid,
            parts.location,
            parts.title,
            parts.files,
            parts.bookmarks,
        );
        book.sort_type = parts.sort_type;
        book.added_to_playlist = parts.added_to_playlist;
        book.rate = if parts.rate.is_finite() && parts.rate > 0.0 {
            parts.rate
        } else {
            DEFAULT_RATE
        };
        book.is_damaged = parts.is_damaged;
        let index = parts
            .cur_file_index
            .min(book.files.count().saturating_sub(1));
        book.files
            .restore_cursor(Cursor::new(index, parts.cur_file_progress));
        book
    }

    fn assemble(
        ctx: &DomainContext,
        uid: Uid,
        location: BookLocation,
        title: String,
        files: Vec<AudioFile>,
        bookmarks: Vec<Bookmark>,
    ) -> Self {
        let mut files = AudioFileCollection::new(files);
        for file in files.files_mut() {
            file.attach(uid);
        }
        let total_duration = files.files().iter().map(|f| f.duration()).sum();

        let mut book = Self {
            ctx: ctx.clone(),
            uid,
            id: BookId::new(location.id_string()),
            location,
            title,
            total_duration,
            play_state: PlayState::Stopped,
            rate: DEFAULT_RATE,
            is_damaged: false,
            added_to_playlist: true,
            play_mode: PlayMode::AudioFile,
            sort_type: SortType::None,
            destroyed: false,
            files,
            bookmarks: BookmarkCollection::new(bookmarks),
            elapsed_at: Vec::new(),
        };
        book.recompute_elapsed();
        book
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn id(&self) -> &BookId {
        &self.id
    }

    pub fn book_ref(&self) -> BookRef {
        BookRef {
            uid: self.uid,
            id: self.id.clone(),
        }
    }

    pub fn context(&self) -> &DomainContext {
        &self.ctx
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn location(&self) -> &BookLocation {
        &self.location
    }

    pub fn source(&self) -> Source {
        self.location.source()
    }

    /// Sum of file durations at construction; never recomputed
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    pub fn is_playing(&self) -> bool {
        self.play_state == PlayState::Playing
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn is_damaged(&self) -> bool {
        self.is_damaged
    }

    pub fn added_to_playlist(&self) -> bool {
        self.added_to_playlist
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn sort_type(&self) -> SortType {
        self.sort_type
    }

    /// True once the repository removed this book's record
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn files(&self) -> &AudioFileCollection {
        &self.files
    }

    pub fn bookmarks(&self) -> &BookmarkCollection {
        &self.bookmarks
    }

    /// The collection selected by the play mode
    pub fn coll(&self) -> ActiveCollection<'_> {
        match self.play_mode {
            PlayMode::AudioFile => ActiveCollection::AudioFiles(&self.files),
            PlayMode::Bookmark => ActiveCollection::Bookmarks(&self.bookmarks),
        }
    }

    /// Resolves the active collection's current item to something playable
    pub fn current_item(&self) -> Option<PlayableItem<'_>> {
        match self.play_mode {
            PlayMode::AudioFile => {
                let file = self.files.cur_item()?;
                Some(PlayableItem {
                    file,
                    start: 0.0,
                    duration: file.duration(),
                    progress: self.files.cur_progress(),
                })
            }
            PlayMode::Bookmark => {
                let mark = self.bookmarks.cur_item()?;
                let file = self.files.find(mark.file_uid())?;
                Some(PlayableItem {
                    file,
                    start: mark.time(),
                    duration: (file.duration() - mark.time()).max(0.0),
                    progress: self.bookmarks.cur_progress(),
                })
            }
        }
    }

    /// File a bookmark points at
    pub fn bookmark_file(&self, mark: &Bookmark) -> Option<&AudioFile> {
        self.files.find(mark.file_uid())
    }

    /// Seconds elapsed across the whole book before the file at `position`
    pub fn elapsed_at(&self, position: usize) -> f64 {
        match self.elapsed_at.get(position) {
            Some(elapsed) => *elapsed,
            None => self.files.files().iter().map(|f| f.duration()).sum(),
        }
    }

    /// Seconds elapsed across the whole book
    pub fn elapsed(&self) -> f64 {
        self.elapsed_at(self.files.cur_index()) + self.files.cur_progress()
    }

    pub fn remaining(&self) -> f64 {
        (self.total_duration - self.elapsed()).max(0.0)
    }

    /// Fraction of the book listened to, in `0.0..=1.0`
    pub fn progress_fraction(&self) -> f64 {
        if self.total_duration <= 0.0 {
            0.0
        } else {
            (self.elapsed() / self.total_duration).clamp(0.0, 1.0)
        }
    }

    // ---- mutations ----

    pub fn set_play_state(&mut self, state: PlayState) {
        let previous = std::mem::replace(&mut self.play_state, state);
        if previous == PlayState::Playing && state != PlayState::Playing {
            self.emit(DomainEvent::BookStateChanged);
        }
    }

    pub fn set_rate(&mut self, rate: f32) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(DomainError::InvalidRate(rate));
        }
        if rate != self.rate {
            self.rate = rate;
            self.emit(DomainEvent::BookStateChanged);
        }
        Ok(())
    }

    /// Sets the damaged flag. Only the false→true edge emits `BookIsDamaged`.
    pub fn set_damaged(&mut self, damaged: bool) {
        if damaged == self.is_damaged {
            return;
        }
        self.is_damaged = damaged;
        self.emit(DomainEvent::BookStateChanged);
        if damaged {
            self.emit(DomainEvent::BookIsDamaged);
        }
    }

    pub fn set_added_to_playlist(&mut self, added: bool) {
        if added == self.added_to_playlist {
            return;
        }
        self.added_to_playlist = added;
        self.emit(DomainEvent::BookStateChanged);
        if added {
            self.emit(DomainEvent::BookToPlaylistAdded);
        } else {
            self.emit(DomainEvent::BookFromPlaylistRemoved);
        }
    }

    /// Switches the active collection; neither cursor is touched
    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
    }

    /// Moves the active collection's cursor
    ///
    /// Returns true if the index changed. An index past the end is rejected
    /// and nothing is published.
    pub fn set_cur_index(&mut self, index: usize) -> Result<bool> {
        match self.play_mode {
            PlayMode::AudioFile => {
                let before = self.files.cur_progress();
                let changed = self.files.set_cur_index(index)?;
                if changed {
                    self.emit(DomainEvent::BookStateChanged);
                } else if before != self.files.cur_progress() {
                    self.emit_file_state();
                }
                Ok(changed)
            }
            PlayMode::Bookmark => {
                let changed = self.bookmarks.set_cur_index(index)?;
                if changed {
                    self.emit(DomainEvent::BookStateChanged);
                }
                Ok(changed)
            }
        }
    }

    /// Sets progress (seconds) within the active collection's current item
    pub fn set_cur_progress(&mut self, progress: f64) {
        match self.play_mode {
            PlayMode::AudioFile => {
                if self.files.set_cur_progress(progress) {
                    self.emit_file_state();
                }
            }
            PlayMode::Bookmark => {
                self.bookmarks.set_cur_progress(progress);
            }
        }
    }

    /// Adds a bookmark on one of this book's files and returns it
    pub fn add_bookmark(
        &mut self,
        file_uid: Uid,
        time: f64,
        comment: impl Into<String>,
    ) -> Result<Bookmark> {
        let file = self
            .files
            .find(file_uid)
            .ok_or(DomainError::UnknownFile { uid: file_uid })?;
        let mark = Bookmark::new(self.ctx.next_uid(), file, time, comment);
        self.insert_bookmark(mark.clone())?;
        Ok(mark)
    }

    /// Inserts an existing bookmark; its file must belong to this book
    pub fn insert_bookmark(&mut self, mark: Bookmark) -> Result<()> {
        if self.files.find(mark.file_uid()).is_none() {
            return Err(DomainError::UnknownFile {
                uid: mark.file_uid(),
            });
        }
        self.bookmarks.add_mark(mark);
        self.emit(DomainEvent::BookStateChanged);
        Ok(())
    }

    /// Removes the first bookmark matching `time` and `comment`
    pub fn remove_bookmark(&mut self, time: f64, comment: &str) -> Option<Bookmark> {
        let removed = self.bookmarks.remove_mark(time, comment)?;
        self.emit(DomainEvent::BookStateChanged);
        Some(removed)
    }

    /// Re-sorts the files. Only media-library books may change sort type.
    pub fn sort(&mut self, sort_type: SortType) {
        if self.source() != Source::MediaLibrary || sort_type == self.sort_type {
            return;
        }

        let current = self.files.cur_item().map(|f| f.uid());
        let keep_position = self.files.cur_index() != 0 || self.files.cur_progress() != 0.0;

        self.files.sort_by(sort_type);
        self.sort_type = sort_type;

        if keep_position {
            if let Some(position) = current.and_then(|uid| self.files.position_of(uid)) {
                self.files.reposition(position);
            }
        }

        self.recompute_elapsed();
        self.emit(DomainEvent::BookStateChanged);
    }

    /// Marks the book as removed from storage; a destroyed book is never
    /// written again
    pub fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    fn recompute_elapsed(&mut self) {
        let mut acc = 0.0;
        self.elapsed_at = self
            .files
            .files()
            .iter()
            .map(|f| {
                let before = acc;
                acc += f.duration();
                before
            })
            .collect();
    }

    fn emit(&self, make: fn(BookRef) -> DomainEvent) {
        self.ctx.dispatcher().notify(make(self.book_ref()));
    }

    fn emit_file_state(&self) {
        if let Some(file) = self.files.cur_item() {
            self.ctx.dispatcher().notify(DomainEvent::AudioFileStateChanged {
                book: self.book_ref(),
                file: file.uid(),
            });
        }
    }
}

/// A book shared between the repository, the player and observers
///
/// Identity fields are cached so indexes never need the lock.
#[derive(Clone)]
pub struct SharedBook {
    inner: Arc<Mutex<Book>>,
    uid: Uid,
    id: BookId,
}

impl SharedBook {
    pub fn new(book: Book) -> Self {
        Self {
            uid: book.uid(),
            id: book.id().clone(),
            inner: Arc::new(Mutex::new(book)),
        }
    }

    /// Locks the book. Mutation is confined to one context, so a poisoned
    /// lock only means a panicking reader; the data is still consistent.
    pub fn lock(&self) -> MutexGuard<'_, Book> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn id(&self) -> &BookId {
        &self.id
    }

    /// True if both handles point at the same aggregate
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Book> for SharedBook {
    fn from(book: Book) -> Self {
        Self::new(book)
    }
}

impl std::fmt::Debug for SharedBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBook")
            .field("uid", &self.uid)
            .field("id", &self.id)
            .finish()
    }
}
