//! Bookmark domain model

use crate::ids::Uid;
use crate::types::audio_file::AudioFile;
use std::cmp::Ordering;

/// A named offset into one audio file of the same book
///
/// Holds the file by uid; the book owns both. The file name is captured at
/// creation because bookmarks order by it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    uid: Uid,
    file_uid: Uid,
    file_name: String,
    time: f64,
    comment: String,
}

impl Bookmark {
    /// Creates a bookmark; `time` is clamped into `0..=file.duration()`
    pub fn new(uid: Uid, file: &AudioFile, time: f64, comment: impl Into<String>) -> Self {
        let time = if time.is_finite() { time } else { 0.0 };
        Self {
            uid,
            file_uid: file.uid(),
            file_name: file.name().to_string(),
            time: time.clamp(0.0, file.duration()),
            comment: comment.into(),
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// Derived string id
    pub fn id(&self) -> String {
        self.uid.to_string()
    }

    pub fn file_uid(&self) -> Uid {
        self.file_uid
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Bookmark order: file name ascending, then time ascending
    pub fn order(&self, other: &Self) -> Ordering {
        self.file_name
            .cmp(&other.file_name)
            .then_with(|| self.time.total_cmp(&other.time))
    }

    /// Match key used by removal: time and comment, not identity
    pub fn matches(&self, time: f64, comment: &str) -> bool {
        self.time == time && self.comment == comment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(name: &str, duration: f64) -> AudioFile {
        AudioFile::from_path(
            Uid::new(1, 100),
            PathBuf::from(format!("/docs/{}.mp3", name)),
            name,
            duration,
            0,
        )
    }

    #[test]
    fn test_time_is_clamped_to_file() {
        let f = file("a", 60.0);
        assert_eq!(Bookmark::new(Uid::new(1, 1), &f, 90.0, "").time(), 60.0);
        assert_eq!(Bookmark::new(Uid::new(1, 2), &f, -1.0, "").time(), 0.0);
        assert_eq!(Bookmark::new(Uid::new(1, 3), &f, 12.0, "").time(), 12.0);
    }

    #[test]
    fn test_order_is_name_then_time() {
        let a = file("fileA", 100.0);
        let b = file("fileB", 100.0);
        let a5 = Bookmark::new(Uid::new(1, 1), &a, 5.0, "");
        let b1 = Bookmark::new(Uid::new(1, 2), &b, 1.0, "");
        let a2 = Bookmark::new(Uid::new(1, 3), &a, 2.0, "");

        assert_eq!(a2.order(&a5), Ordering::Less);
        assert_eq!(a5.order(&b1), Ordering::Less);
        assert_eq!(b1.order(&a2), Ordering::Greater);
    }

    #[test]
    fn test_matches_ignores_identity() {
        let f = file("a", 100.0);
        let first = Bookmark::new(Uid::new(1, 1), &f, 5.0, "here");
        let second = Bookmark::new(Uid::new(1, 2), &f, 5.0, "here");
        assert!(first.matches(second.time(), second.comment()));
        assert!(!first.matches(5.0, "elsewhere"));
    }

    #[test]
    fn test_id_derives_from_uid() {
        let f = file("a", 10.0);
        let mark = Bookmark::new(Uid::new(4, 9), &f, 1.0, "");
        assert_eq!(mark.id(), "4-9");
        assert_eq!(mark.file_uid(), Uid::new(1, 100));
    }
}
