//! Ordered collections with a "current position"
//!
//! A book owns two collections: its audio files and its bookmarks. Both keep
//! a [`Cursor`] (current index + progress in seconds). Which one the player
//! follows is selected by [`PlayMode`] and exposed as [`ActiveCollection`].

use crate::error::{DomainError, Result};
use crate::ids::Uid;
use crate::types::audio_file::AudioFile;
use crate::types::bookmark::Bookmark;
use crate::types::source::SortType;

/// Which collection of a book is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    #[default]
    AudioFile,
    Bookmark,
}

/// Current index and progress within a collection
///
/// `index` may equal the item count when the collection is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cursor {
    index: usize,
    progress: f64,
}

impl Cursor {
    pub fn new(index: usize, progress: f64) -> Self {
        Self {
            index,
            progress: sanitize_progress(progress),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Moves to `index`. Progress resets when the item changes, and also when
    /// re-selecting the only item of a single-item collection.
    ///
    /// Returns true if the index changed. Only index 0 is accepted on an
    /// empty collection.
    fn select(&mut self, index: usize, count: usize) -> Result<bool> {
        if index >= count.max(1) {
            return Err(DomainError::IndexOutOfBounds { index, count });
        }
        let changed = index != self.index;
        if changed || count == 1 {
            self.progress = 0.0;
        }
        self.index = index;
        Ok(changed)
    }

    /// Returns true if the progress changed
    fn set_progress(&mut self, progress: f64) -> bool {
        let progress = sanitize_progress(progress);
        let changed = progress != self.progress;
        self.progress = progress;
        changed
    }
}

fn sanitize_progress(progress: f64) -> f64 {
    if progress.is_finite() && progress > 0.0 {
        progress
    } else {
        0.0
    }
}

/// The audio files of a book in their current canonical order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFileCollection {
    files: Vec<AudioFile>,
    cursor: Cursor,
}

impl AudioFileCollection {
    pub fn new(files: Vec<AudioFile>) -> Self {
        Self {
            files,
            cursor: Cursor::default(),
        }
    }

    pub fn files(&self) -> &[AudioFile] {
        &self.files
    }

    pub fn get(&self, position: usize) -> Option<&AudioFile> {
        self.files.get(position)
    }

    pub fn count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn cur_index(&self) -> usize {
        self.cursor.index
    }

    pub fn cur_progress(&self) -> f64 {
        self.cursor.progress
    }

    /// `None` when the current index is out of bounds
    pub fn cur_item(&self) -> Option<&AudioFile> {
        self.files.get(self.cursor.index)
    }

    pub fn find(&self, uid: Uid) -> Option<&AudioFile> {
        self.files.iter().find(|f| f.uid() == uid)
    }

    /// Position of a file in the current order
    pub fn position_of(&self, uid: Uid) -> Option<usize> {
        self.files.iter().position(|f| f.uid() == uid)
    }

    /// See [`Cursor`] for the progress reset rules
    pub fn set_cur_index(&mut self, index: usize) -> Result<bool> {
        let count = self.files.len();
        self.cursor.select(index, count)
    }

    pub fn set_cur_progress(&mut self, progress: f64) -> bool {
        self.cursor.set_progress(progress)
    }

    /// Re-orders files by `sort_type`; the cursor is left untouched
    pub fn sort_by(&mut self, sort_type: SortType) {
        match sort_type {
            SortType::None => self.files.sort_by_key(|f| f.index()),
            SortType::Title => self.files.sort_by(|a, b| {
                a.name().cmp(b.name()).then_with(|| a.index().cmp(&b.index()))
            }),
        }
    }

    pub(crate) fn files_mut(&mut self) -> &mut [AudioFile] {
        &mut self.files
    }

    /// Moves the cursor without resetting progress
    pub(crate) fn reposition(&mut self, index: usize) {
        self.cursor.index = index;
    }

    pub(crate) fn restore_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }
}

/// Bookmarks of a book, kept in (file name, time) order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkCollection {
    marks: Vec<Bookmark>,
    cursor: Cursor,
}

impl BookmarkCollection {
    pub fn new(mut marks: Vec<Bookmark>) -> Self {
        marks.sort_by(|a, b| a.order(b));
        Self {
            marks,
            cursor: Cursor::default(),
        }
    }

    pub fn marks(&self) -> &[Bookmark] {
        &self.marks
    }

    pub fn get(&self, position: usize) -> Option<&Bookmark> {
        self.marks.get(position)
    }

    pub fn count(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn cur_index(&self) -> usize {
        self.cursor.index
    }

    pub fn cur_progress(&self) -> f64 {
        self.cursor.progress
    }

    pub fn cur_item(&self) -> Option<&Bookmark> {
        self.marks.get(self.cursor.index)
    }

    pub fn set_cur_index(&mut self, index: usize) -> Result<bool> {
        let count = self.marks.len();
        self.cursor.select(index, count)
    }

    pub fn set_cur_progress(&mut self, progress: f64) -> bool {
        self.cursor.set_progress(progress)
    }

    /// Inserts `mark` in order. If it lands before the current bookmark the
    /// index shifts so "current" keeps pointing at the same bookmark.
    ///
    /// Returns the position the mark was inserted at.
    pub fn add_mark(&mut self, mark: Bookmark) -> usize {
        let before_current = self
            .cur_item()
            .map(|current| mark.order(current).is_lt())
            .unwrap_or(false);
        let uid = mark.uid();

        self.marks.push(mark);
        self.marks.sort_by(|a, b| a.order(b));

        if before_current {
            self.cursor.index += 1;
        }

        self.marks
            .iter()
            .position(|m| m.uid() == uid)
            .unwrap_or(self.marks.len() - 1)
    }

    /// Removes the first bookmark whose time and comment match
    ///
    /// Removing the current bookmark makes the next one current, or the new
    /// last one when it was last.
    pub fn remove_mark(&mut self, time: f64, comment: &str) -> Option<Bookmark> {
        let position = self.marks.iter().position(|m| m.matches(time, comment))?;
        let removed = self.marks.remove(position);

        if position < self.cursor.index {
            self.cursor.index -= 1;
        } else if position == self.cursor.index {
            self.cursor.progress = 0.0;
            if self.cursor.index >= self.marks.len() {
                self.cursor.index = self.marks.len().saturating_sub(1);
            }
        }

        Some(removed)
    }
}

/// Item of the active collection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectionItem<'a> {
    File(&'a AudioFile),
    Bookmark(&'a Bookmark),
}

/// Whichever collection a book's play mode selects, behind one interface
#[derive(Debug, Clone, Copy)]
pub enum ActiveCollection<'a> {
    AudioFiles(&'a AudioFileCollection),
    Bookmarks(&'a BookmarkCollection),
}

impl<'a> ActiveCollection<'a> {
    pub fn mode(&self) -> PlayMode {
        match self {
            Self::AudioFiles(_) => PlayMode::AudioFile,
            Self::Bookmarks(_) => PlayMode::Bookmark,
        }
    }

    pub fn cur_index(&self) -> usize {
        match self {
            Self::AudioFiles(c) => c.cur_index(),
            Self::Bookmarks(c) => c.cur_index(),
        }
    }

    pub fn cur_progress(&self) -> f64 {
        match self {
            Self::AudioFiles(c) => c.cur_progress(),
            Self::Bookmarks(c) => c.cur_progress(),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Self::AudioFiles(c) => c.count(),
            Self::Bookmarks(c) => c.count(),
        }
    }

    pub fn cur_item(&self) -> Option<CollectionItem<'a>> {
        match self {
            Self::AudioFiles(c) => c.cur_item().map(CollectionItem::File),
            Self::Bookmarks(c) => c.cur_item().map(CollectionItem::Bookmark),
        }
    }

    /// Index after the current one, wrapping to the first
    pub fn next_index(&self) -> usize {
        let count = self.count();
        if count == 0 {
            0
        } else {
            (self.cur_index() + 1) % count
        }
    }

    /// Index before the current one, wrapping to the last
    pub fn prev_index(&self) -> usize {
        let count = self.count();
        match (count, self.cur_index()) {
            (0, _) => 0,
            (_, 0) => count - 1,
            (_, index) => (index - 1).min(count - 1),
        }
    }

    /// True if there is an item after the current one without wrapping
    pub fn has_next(&self) -> bool {
        self.cur_index() + 1 < self.count()
    }
}
