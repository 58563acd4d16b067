//! Reading progress: completed chapters per book, persisted as one JSON file.
//!
//! File format is `{"<book id>": [<chapter>, ...]}` with chapters kept
//! ascending. A missing or unparsable file is treated as empty progress,
//! and write failures are logged and otherwise ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{find_book, Book};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingProgress(BTreeMap<String, Vec<u32>>);

impl ReadingProgress {
    pub fn is_completed(&self, book_id: &str, chapter: u32) -> bool {
        self.chapters(book_id).contains(&chapter)
    }

    pub fn completed_count(&self, book_id: &str) -> usize {
        self.chapters(book_id).len()
    }

    pub fn chapters(&self, book_id: &str) -> &[u32] {
        self.0.get(book_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Keep only catalog books and their valid chapters, sorted and unique.
    fn sanitize(mut self) -> Self {
        self.0.retain(|id, chapters| {
            let Some(book) = find_book(id) else {
                warn!("Dropping progress for unknown book '{id}'");
                return false;
            };
            let before = chapters.len();
            chapters.retain(|&c| book.has_chapter(c));
            if chapters.len() != before {
                warn!("Dropping out-of-range chapters for {id}");
            }
            chapters.sort_unstable();
            chapters.dedup();
            true
        });
        self
    }
}

/// Flip membership of `chapter` in `book`'s completed set.
///
/// Returns a new mapping and leaves `progress` untouched. Chapters outside
/// `1..=book.chapters` are rejected and the mapping is returned unchanged.
pub fn toggle(progress: &ReadingProgress, book: &Book, chapter: u32) -> ReadingProgress {
    if !book.has_chapter(chapter) {
        warn!("Ignoring toggle of {} chapter {chapter} (has {})", book.id, book.chapters);
        return progress.clone();
    }

    let mut next = progress.clone();
    let chapters = next.0.entry(book.id.to_string()).or_default();
    match chapters.binary_search(&chapter) {
        Ok(pos) => {
            chapters.remove(pos);
            debug!("Unmarked {} {chapter}", book.id);
        }
        Err(pos) => {
            chapters.insert(pos, chapter);
            debug!("Marked {} {chapter} as read", book.id);
        }
    }
    next
}

pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ReadingProgress {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!("No progress at {} ({e}), starting empty", self.path.display());
                return ReadingProgress::default();
            }
        };

        match parse(&contents) {
            Some(progress) => {
                info!("Loaded reading progress from {}", self.path.display());
                progress
            }
            None => {
                warn!("Malformed progress file {}, starting empty", self.path.display());
                ReadingProgress::default()
            }
        }
    }

    pub fn save(&self, progress: &ReadingProgress) {
        if let Some(dir) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("Failed to create progress dir {}: {e}", dir.display());
                return;
            }
        }

        match serde_json::to_string(progress) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!("Failed to write progress to {}: {e}", self.path.display());
                }
            }
            Err(e) => warn!("Failed to serialize progress: {e}"),
        }
    }
}

/// Deserialize stored progress, `None` when the data is not a book → chapters map.
pub fn parse(data: &str) -> Option<ReadingProgress> {
    serde_json::from_str::<ReadingProgress>(data)
        .ok()
        .map(ReadingProgress::sanitize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BIBLE_BOOKS;

    fn genesis() -> &'static Book {
        find_book("genesis").unwrap()
    }

    #[test]
    fn toggle_marks_then_unmarks() {
        let empty = ReadingProgress::default();
        let marked = toggle(&empty, genesis(), 3);
        assert_eq!(marked.chapters("genesis"), &[3]);

        let unmarked = toggle(&marked, genesis(), 3);
        assert!(unmarked.chapters("genesis").is_empty());
    }

    #[test]
    fn toggle_does_not_mutate_input() {
        let before = toggle(&ReadingProgress::default(), genesis(), 1);
        let snapshot = before.clone();
        let _ = toggle(&before, genesis(), 2);
        assert_eq!(before, snapshot);
    }

    #[test]
    fn double_toggle_restores_membership_for_every_chapter() {
        let mut base = ReadingProgress::default();
        for c in [2, 5, 9] {
            base = toggle(&base, genesis(), c);
        }
        for book in BIBLE_BOOKS.iter().take(3) {
            for chapter in 1..=book.chapters {
                let twice = toggle(&toggle(&base, book, chapter), book, chapter);
                assert_eq!(
                    twice.is_completed(book.id, chapter),
                    base.is_completed(book.id, chapter),
                );
                assert_eq!(twice.completed_count(book.id), base.completed_count(book.id));
            }
        }
    }

    #[test]
    fn toggle_rejects_out_of_range_chapters() {
        let p = ReadingProgress::default();
        assert_eq!(toggle(&p, genesis(), 0), p);
        assert_eq!(toggle(&p, genesis(), 51), p);
    }

    #[test]
    fn corrupt_data_parses_as_none() {
        assert!(parse("not json").is_none());
        assert!(parse(r#"{"genesis": "three"}"#).is_none());
        assert!(parse("[1,2,3]").is_none());
    }

    #[test]
    fn parse_drops_duplicates() {
        let p = parse(r#"{"john": [16, 3, 16]}"#).unwrap();
        assert_eq!(p.chapters("john"), &[3, 16]);
    }

    #[test]
    fn parse_drops_unknown_books_and_out_of_range_chapters() {
        let p = parse(r#"{"genesis": [0, 3, 51], "maccabees": [1], "jude": [1, 2]}"#).unwrap();
        assert_eq!(p.chapters("genesis"), &[3]);
        assert_eq!(p.chapters("jude"), &[1]);
        assert!(p.chapters("maccabees").is_empty());
        assert!(p.completed_count("genesis") <= genesis().chapters as usize);
    }

    #[test]
    fn marks_stay_sorted_regardless_of_order() {
        let mut p = ReadingProgress::default();
        for c in [9, 2, 5] {
            p = toggle(&p, genesis(), c);
        }
        assert_eq!(p.chapters("genesis"), &[2, 5, 9]);
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("nested/bible-progress.json"));

        let mut progress = toggle(&ReadingProgress::default(), genesis(), 3);
        progress = toggle(&progress, genesis(), 1);
        progress = toggle(&progress, find_book("john").unwrap(), 21);
        store.save(&progress);

        assert_eq!(store.load(), progress);
    }

    #[test]
    fn store_load_defaults_when_missing_or_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("bible-progress.json"));
        assert_eq!(store.load(), ReadingProgress::default());

        fs::write(store.path(), "{ truncated").unwrap();
        assert_eq!(store.load(), ReadingProgress::default());
    }

    #[test]
    fn save_to_unwritable_location_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        // Parent is a regular file, so create_dir_all fails.
        let store = ProgressStore::new(blocker.join("bible-progress.json"));
        store.save(&ReadingProgress::default());
        assert_eq!(store.load(), ReadingProgress::default());
    }
}
