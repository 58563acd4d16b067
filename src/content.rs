//! Chapter text loading with stale-response protection.
//!
//! Every fetch is stamped with a monotonically increasing token. Only the
//! outcome whose token matches the most recently issued one may populate
//! the content; anything older is dropped on arrival.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::catalog::Book;
use crate::error::ContentError;

/// Shown in place of chapter text when the fetch fails.
pub const LOAD_FAILED_TEXT: &str = "載入失敗，請檢查網路連線或 API Key 設定。";

/// Remote source of chapter text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn fetch_chapter_text(&self, book_name: &str, chapter: u32)
        -> Result<String, ContentError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentState {
    Empty,
    Loading,
    Ready(String),
    Failed,
}

impl ContentState {
    /// Text the view shows, including the failure placeholder.
    pub fn display_text(&self) -> Option<&str> {
        match self {
            Self::Ready(text) => Some(text),
            Self::Failed => Some(LOAD_FAILED_TEXT),
            Self::Empty | Self::Loading => None,
        }
    }

    /// Text that may be handed to speech synthesis. Never the placeholder.
    pub fn playable_text(&self) -> Option<&str> {
        match self {
            Self::Ready(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// One pending fetch, to be run off the state-owning task.
pub struct FetchJob {
    token: u64,
    book_name: &'static str,
    chapter: u32,
    generator: Arc<dyn TextGenerator>,
}

impl FetchJob {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub async fn run(self) -> FetchOutcome {
        debug!("Fetching {} {} (token {})", self.book_name, self.chapter, self.token);
        let result = self
            .generator
            .fetch_chapter_text(self.book_name, self.chapter)
            .await;
        FetchOutcome {
            token: self.token,
            result,
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub token: u64,
    pub result: Result<String, ContentError>,
}

pub struct ContentLoader {
    generator: Arc<dyn TextGenerator>,
    latest: u64,
    state: ContentState,
}

impl ContentLoader {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            latest: 0,
            state: ContentState::Empty,
        }
    }

    pub fn state(&self) -> &ContentState {
        &self.state
    }

    /// Start loading a chapter. Supersedes any fetch still in flight.
    pub fn begin(&mut self, book: &'static Book, chapter: u32) -> FetchJob {
        self.latest += 1;
        self.state = ContentState::Loading;
        FetchJob {
            token: self.latest,
            book_name: book.name,
            chapter,
            generator: Arc::clone(&self.generator),
        }
    }

    /// Apply a finished fetch. Returns false when the outcome was stale.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.token != self.latest {
            debug!(
                "Discarding stale chapter text (token {}, latest {})",
                outcome.token, self.latest
            );
            return false;
        }

        self.state = match outcome.result {
            Ok(text) => {
                info!("Chapter text loaded ({} chars)", text.chars().count());
                ContentState::Ready(text)
            }
            Err(e) => {
                warn!("Failed to load chapter text: {e}");
                ContentState::Failed
            }
        };
        true
    }
}
