//! Current book/chapter, sidebar visibility and the book filter.

use tracing::warn;

use crate::catalog::{find_book, Book, Testament, BIBLE_BOOKS};

pub struct Selection {
    book: &'static Book,
    chapter: u32,
    sidebar_open: bool,
    filter: String,
}

impl Selection {
    pub fn book(&self) -> &'static Book {
        self.book
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_sidebar(&mut self, open: bool) {
        self.sidebar_open = open;
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    /// Switch book, resetting to chapter 1 and closing the sidebar.
    ///
    /// Returns false for an unknown id.
    pub fn select_book(&mut self, id: &str) -> bool {
        let Some(book) = find_book(id) else {
            warn!("Unknown book id: {id}");
            return false;
        };
        self.book = book;
        self.chapter = 1;
        self.sidebar_open = false;
        true
    }

    /// Returns false when `chapter` is outside the current book.
    pub fn select_chapter(&mut self, chapter: u32) -> bool {
        if !self.book.has_chapter(chapter) {
            warn!("{} has no chapter {chapter}", self.book.id);
            return false;
        }
        self.chapter = chapter;
        true
    }

    pub fn next_chapter(&self) -> Option<u32> {
        let next = self.chapter + 1;
        self.book.has_chapter(next).then_some(next)
    }

    pub fn previous_chapter(&self) -> Option<u32> {
        let prev = self.chapter.checked_sub(1)?;
        self.book.has_chapter(prev).then_some(prev)
    }

    /// Books whose display name contains the filter (or whose id does).
    pub fn filtered_books(&self) -> impl Iterator<Item = &'static Book> + '_ {
        let filter = self.filter.as_str();
        BIBLE_BOOKS
            .iter()
            .filter(move |b| b.name.contains(filter) || b.id.contains(filter))
    }

    pub fn filtered_in(&self, testament: Testament) -> Vec<&'static Book> {
        self.filtered_books().filter(|b| b.testament == testament).collect()
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            book: &BIBLE_BOOKS[0],
            chapter: 1,
            sidebar_open: false,
            filter: String::new(),
        }
    }
}
