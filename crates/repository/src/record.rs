//! Book record serializer
//!
//! One flat JSON document per book. Field names are camelCase with the
//! legacy `playlistID`/`fileUID` spellings kept. Location fields are optional
//! on the wire and validated on the way back in: exactly one of them must be
//! present on a book and on each file.

use crate::error::RecordError;
use audioshelf_core::{
    AudioFile, Book, BookLocation, BookParts, Bookmark, DomainContext, SortType, Source, Uid,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub uid: String,
    pub title: String,
    pub source: u8,
    pub sort_type: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    #[serde(rename = "playlistID", default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<u64>,
    pub added_to_playlist: bool,
    /// Whole seconds into the current file
    pub cur_file_progress: u64,
    pub cur_file_index: usize,
    pub rate: f32,
    pub is_damaged: bool,
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub bookmarks: Vec<BookmarkRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub uid: String,
    pub id: String,
    pub name: String,
    pub index: usize,
    pub duration: f64,
    pub source: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "playlistID", default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRecord {
    pub uid: String,
    pub comment: String,
    pub time: f64,
    #[serde(rename = "fileUID")]
    pub file_uid: String,
}

impl BookRecord {
    /// Captures a point-in-time copy of `book`
    pub fn from_book(book: &Book) -> Self {
        let files = book.files();
        Self {
            uid: book.uid().to_string(),
            title: book.title().to_string(),
            source: book.source().code(),
            sort_type: book.sort_type().code(),
            folder_path: book
                .location()
                .folder_path()
                .map(|p| p.to_string_lossy().into_owned()),
            playlist_id: book.location().playlist_id(),
            added_to_playlist: book.added_to_playlist(),
            cur_file_progress: files.cur_progress().floor() as u64,
            cur_file_index: files.cur_index(),
            rate: book.rate(),
            is_damaged: book.is_damaged(),
            files: files.files().iter().map(FileRecord::from_file).collect(),
            bookmarks: book
                .bookmarks()
                .marks()
                .iter()
                .map(BookmarkRecord::from_bookmark)
                .collect(),
        }
    }

    /// Rebuilds the book. Nothing is published on `ctx`.
    pub fn into_book(self, ctx: &DomainContext) -> Result<Book, RecordError> {
        let uid: Uid = self.uid.parse()?;
        let source = Source::from_code(self.source).ok_or(RecordError::UnknownSource(self.source))?;
        let sort_type = SortType::from_code(self.sort_type)
            .ok_or(RecordError::UnknownSortType(self.sort_type))?;

        let location = match (self.folder_path, self.playlist_id) {
            (Some(_), Some(_)) => {
                return Err(RecordError::BookLocationConflict { uid: self.uid });
            }
            (None, None) => return Err(RecordError::BookLocationMissing { uid: self.uid }),
            (Some(path), None) => BookLocation::Folder(PathBuf::from(path)),
            (None, Some(id)) => BookLocation::Playlist(id),
        };
        if location.source() != source {
            return Err(RecordError::SourceMismatch {
                uid: self.uid,
                code: self.source,
            });
        }

        let files = self
            .files
            .into_iter()
            .map(FileRecord::into_file)
            .collect::<Result<Vec<_>, _>>()?;

        let mut bookmarks = Vec::with_capacity(self.bookmarks.len());
        for record in self.bookmarks {
            let file_uid: Uid = record.file_uid.parse()?;
            let file = files.iter().find(|f| f.uid() == file_uid).ok_or_else(|| {
                RecordError::DanglingFileRef {
                    bookmark: record.uid.clone(),
                    file: record.file_uid.clone(),
                }
            })?;
            let mark_uid: Uid = record.uid.parse()?;
            bookmarks.push(Bookmark::new(mark_uid, file, record.time, record.comment));
        }

        Ok(Book::restore(
            ctx,
            BookParts {
                uid,
                location,
                title: self.title,
                sort_type,
                added_to_playlist: self.added_to_playlist,
                rate: self.rate,
                is_damaged: self.is_damaged,
                files,
                bookmarks,
                cur_file_index: self.cur_file_index,
                cur_file_progress: self.cur_file_progress as f64,
            },
        ))
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl FileRecord {
    fn from_file(file: &AudioFile) -> Self {
        Self {
            uid: file.uid().to_string(),
            id: file.id().to_string(),
            name: file.name().to_string(),
            index: file.index(),
            duration: file.duration(),
            source: file.source().code(),
            path: file.location().path().map(|p| p.to_string_lossy().into_owned()),
            playlist_id: file.location().playlist_item_id(),
        }
    }

    fn into_file(self) -> Result<AudioFile, RecordError> {
        let uid: Uid = self.uid.parse()?;
        let source = Source::from_code(self.source).ok_or(RecordError::UnknownSource(self.source))?;
        let file = match (self.path, self.playlist_id) {
            (Some(_), Some(_)) => return Err(RecordError::FileLocationConflict { uid: self.uid }),
            (None, None) => return Err(RecordError::FileLocationMissing { uid: self.uid }),
            (Some(path), None) => {
                AudioFile::from_path(uid, PathBuf::from(path), self.name, self.duration, self.index)
            }
            (None, Some(item)) => {
                AudioFile::from_playlist_item(uid, item, self.name, self.duration, self.index)
            }
        };
        if file.source() != source {
            return Err(RecordError::SourceMismatch {
                uid: self.uid,
                code: self.source,
            });
        }
        Ok(file)
    }
}

impl BookmarkRecord {
    fn from_bookmark(mark: &Bookmark) -> Self {
        Self {
            uid: mark.uid().to_string(),
            comment: mark.comment().to_string(),
            time: mark.time(),
            file_uid: mark.file_uid().to_string(),
        }
    }
}

/// Serializes `book` into record bytes
pub fn serialize_book(book: &Book) -> serde_json::Result<Vec<u8>> {
    BookRecord::from_book(book).to_bytes()
}

/// Decodes record bytes into a book bound to `ctx`
pub fn deserialize_book(ctx: &DomainContext, bytes: &[u8]) -> Result<Book, RecordError> {
    BookRecord::from_bytes(bytes)?.into_book(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use audioshelf_core::{EventLog, PlayMode};

    fn sample_book(ctx: &DomainContext) -> Book {
        let files = vec![
            AudioFile::from_playlist_item(ctx.next_uid(), 501, "Part 2", 120.0, 1),
            AudioFile::from_playlist_item(ctx.next_uid(), 500, "Part 1", 90.5, 0),
        ];
        let mut book = Book::from_playlist(ctx, 77, "Dune", files);
        book.sort(SortType::Title);
        let part2 = book.files().get(1).map(|f| f.uid()).unwrap();
        book.add_bookmark(part2, 30.0, "sandworm").unwrap();
        book.add_bookmark(part2, 10.0, "").unwrap();
        book.set_cur_index(1).unwrap();
        book.set_cur_progress(44.0);
        book.set_rate(1.5).unwrap();
        book.set_added_to_playlist(false);
        book
    }

    #[test]
    fn test_round_trip_preserves_book() {
        let ctx = DomainContext::new(3);
        let book = sample_book(&ctx);

        let bytes = serialize_book(&book).unwrap();
        let restored_ctx = DomainContext::new(4);
        let log = EventLog::attach(restored_ctx.dispatcher());
        let restored = deserialize_book(&restored_ctx, &bytes).unwrap();

        assert_eq!(restored.uid(), book.uid());
        assert_eq!(restored.id(), book.id());
        assert_eq!(restored.title(), "Dune");
        assert_eq!(restored.location(), book.location());
        assert_eq!(restored.sort_type(), SortType::Title);
        assert_eq!(restored.files().files(), book.files().files());
        assert_eq!(restored.bookmarks().marks(), book.bookmarks().marks());
        assert_eq!(restored.files().cur_index(), 1);
        assert_eq!(restored.files().cur_progress(), 44.0);
        assert_eq!(restored.rate(), 1.5);
        assert!(!restored.added_to_playlist());
        assert!(!restored.is_damaged());
        assert_eq!(restored.play_mode(), PlayMode::AudioFile);
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_wire_field_names() {
        let ctx = DomainContext::new(3);
        let book = sample_book(&ctx);
        let bytes = serialize_book(&book).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["playlistID"], 77);
        assert!(json.get("folderPath").is_none());
        assert_eq!(json["source"], 1);
        assert_eq!(json["sortType"], 1);
        assert_eq!(json["curFileProgress"], 44);
        assert_eq!(json["files"][0]["playlistID"], 500);
        assert!(json["bookmarks"][0]["fileUID"].is_string());
    }

    #[test]
    fn test_progress_is_whole_seconds() {
        let ctx = DomainContext::new(1);
        let files = vec![AudioFile::from_path(
            ctx.next_uid(),
            PathBuf::from("/b/a.mp3"),
            "a",
            100.0,
            0,
        )];
        let mut book = Book::from_folder(&ctx, "/b", "B", files);
        book.set_cur_progress(12.9);
        assert_eq!(BookRecord::from_book(&book).cur_file_progress, 12);
    }

    fn folder_record() -> BookRecord {
        BookRecord {
            uid: "1-1".into(),
            title: "Folder".into(),
            source: 0,
            sort_type: 0,
            folder_path: Some("/docs/folder".into()),
            playlist_id: None,
            added_to_playlist: true,
            cur_file_progress: 0,
            cur_file_index: 0,
            rate: 1.0,
            is_damaged: false,
            files: vec![FileRecord {
                uid: "1-2".into(),
                id: "/docs/folder/a.mp3".into(),
                name: "a".into(),
                index: 0,
                duration: 10.0,
                source: 0,
                path: Some("/docs/folder/a.mp3".into()),
                playlist_id: None,
            }],
            bookmarks: vec![BookmarkRecord {
                uid: "1-3".into(),
                comment: "".into(),
                time: 1.0,
                file_uid: "1-2".into(),
            }],
        }
    }

    #[test]
    fn test_valid_record_decodes() {
        let ctx = DomainContext::new(2);
        let book = folder_record().into_book(&ctx).unwrap();
        assert_eq!(book.id().as_str(), "/docs/folder");
        assert_eq!(book.bookmarks().count(), 1);
    }

    #[test]
    fn test_book_location_violations() {
        let ctx = DomainContext::new(2);

        let mut both = folder_record();
        both.playlist_id = Some(4);
        assert!(matches!(
            both.into_book(&ctx),
            Err(RecordError::BookLocationConflict { .. })
        ));

        let mut neither = folder_record();
        neither.folder_path = None;
        assert!(matches!(
            neither.into_book(&ctx),
            Err(RecordError::BookLocationMissing { .. })
        ));
    }

    #[test]
    fn test_file_location_violations() {
        let ctx = DomainContext::new(2);

        let mut both = folder_record();
        both.files[0].playlist_id = Some(4);
        assert!(matches!(
            both.into_book(&ctx),
            Err(RecordError::FileLocationConflict { .. })
        ));

        let mut neither = folder_record();
        neither.files[0].path = None;
        assert!(matches!(
            neither.into_book(&ctx),
            Err(RecordError::FileLocationMissing { .. })
        ));
    }

    #[test]
    fn test_dangling_bookmark() {
        let ctx = DomainContext::new(2);
        let mut record = folder_record();
        record.bookmarks[0].file_uid = "9-9".into();
        assert!(matches!(
            record.into_book(&ctx),
            Err(RecordError::DanglingFileRef { .. })
        ));
    }

    #[test]
    fn test_bad_codes_and_uids() {
        let ctx = DomainContext::new(2);

        let mut source = folder_record();
        source.source = 7;
        assert!(matches!(
            source.into_book(&ctx),
            Err(RecordError::UnknownSource(7))
        ));

        let mut mismatch = folder_record();
        mismatch.source = 1;
        assert!(matches!(
            mismatch.into_book(&ctx),
            Err(RecordError::SourceMismatch { .. })
        ));

        let mut uid = folder_record();
        uid.uid = "nope".into();
        assert!(matches!(uid.into_book(&ctx), Err(RecordError::InvalidUid(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            BookRecord::from_bytes(b"{ not json"),
            Err(RecordError::Malformed(_))
        ));
    }
}
