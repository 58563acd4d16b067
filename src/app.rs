//! Reader orchestration: turns user intents into state changes and jobs.
//!
//! Every method runs synchronously on the task that owns the reader. Work
//! that has to wait on the network comes back as an `Effect` for the caller
//! to run; its result is fed back through `on_fetched` / `on_synthesized`.

use tracing::{debug, info};

use crate::content::{ContentLoader, ContentState, FetchJob, FetchOutcome};
use crate::input::Command;
use crate::notifier::Notifier;
use crate::player::{AudioState, PlaybackController};
use crate::progress::{self, ProgressStore, ReadingProgress};
use crate::selection::Selection;
use crate::speech::{SynthesisJob, SynthesisOutcome};

pub const AUDIO_FAILED_TITLE: &str = "音訊無法播放";
pub const AUDIO_FAILED_TEXT: &str = "音訊無法播放，請確認 API Key 設定是否正確。";

/// Suspending work requested by a state change.
pub enum Effect {
    Fetch(FetchJob),
    Synthesize(SynthesisJob),
}

pub struct ReaderApp {
    selection: Selection,
    content: ContentLoader,
    player: PlaybackController,
    store: ProgressStore,
    progress: ReadingProgress,
    notifier: Notifier,
}

impl ReaderApp {
    /// Build the reader and load saved progress.
    pub fn new(
        selection: Selection,
        content: ContentLoader,
        player: PlaybackController,
        store: ProgressStore,
        notifier: Notifier,
    ) -> Self {
        let progress = store.load();
        Self {
            selection,
            content,
            player,
            store,
            progress,
            notifier,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn content(&self) -> &ContentState {
        self.content.state()
    }

    pub fn audio_state(&self) -> AudioState {
        self.player.state()
    }

    pub fn progress(&self) -> &ReadingProgress {
        &self.progress
    }

    /// Load the chapter that is selected at startup.
    pub fn start(&mut self) -> Effect {
        self.load_current()
    }

    /// Dispatch one command. `Quit` and `Help` are handled by the caller.
    pub fn handle(&mut self, command: Command) -> Option<Effect> {
        match command {
            Command::Sidebar(open) => {
                self.selection.set_sidebar(open);
                None
            }
            Command::Search(filter) => {
                self.selection.set_filter(filter);
                self.selection.set_sidebar(true);
                None
            }
            Command::OpenBook(id) => self.select_book(&id),
            Command::Chapter(n) => self.tap_chapter(n),
            Command::Next => {
                let next = self.selection.next_chapter()?;
                self.select_chapter(next)
            }
            Command::Previous => {
                let prev = self.selection.previous_chapter()?;
                self.select_chapter(prev)
            }
            Command::Play => self.play(),
            Command::Stop => {
                self.player.stop();
                None
            }
            Command::Pause => {
                self.player.pause();
                None
            }
            Command::Mark(chapter) => {
                let chapter = chapter.unwrap_or(self.selection.chapter());
                self.toggle_completed(chapter);
                None
            }
            Command::Help | Command::Quit => None,
        }
    }

    pub fn select_book(&mut self, id: &str) -> Option<Effect> {
        if !self.selection.select_book(id) {
            return None;
        }
        Some(self.load_current())
    }

    pub fn select_chapter(&mut self, chapter: u32) -> Option<Effect> {
        if !self.selection.select_chapter(chapter) {
            return None;
        }
        Some(self.load_current())
    }

    /// Tapping the current chapter toggles playback; any other chapter is selected.
    pub fn tap_chapter(&mut self, chapter: u32) -> Option<Effect> {
        if chapter != self.selection.chapter() {
            return self.select_chapter(chapter);
        }
        if self.player.state() == AudioState::Playing {
            self.player.stop();
            None
        } else {
            self.play()
        }
    }

    /// Stop audio, then fetch text for the current selection.
    fn load_current(&mut self) -> Effect {
        if self.player.state() != AudioState::Idle {
            self.player.stop();
        }
        let book = self.selection.book();
        let chapter = self.selection.chapter();
        info!("Loading {} {chapter}", book.id);
        Effect::Fetch(self.content.begin(book, chapter))
    }

    pub fn play(&mut self) -> Option<Effect> {
        if self.content.state().is_loading() {
            debug!("play() ignored while chapter text is loading");
            return None;
        }
        match self.player.play(self.content.state().playable_text()) {
            Ok(job) => job.map(Effect::Synthesize),
            Err(_) => {
                self.notifier.alert(AUDIO_FAILED_TITLE, AUDIO_FAILED_TEXT);
                None
            }
        }
    }

    pub fn toggle_completed(&mut self, chapter: u32) {
        let book = self.selection.book();
        let next = progress::toggle(&self.progress, book, chapter);
        if next == self.progress {
            return;
        }
        self.progress = next;
        self.store.save(&self.progress);
        self.notifier.haptic();
    }

    pub fn on_fetched(&mut self, outcome: FetchOutcome) -> bool {
        self.content.apply(outcome)
    }

    pub fn on_synthesized(&mut self, outcome: SynthesisOutcome) {
        if self.player.complete(outcome).is_err() {
            self.notifier.alert(AUDIO_FAILED_TITLE, AUDIO_FAILED_TEXT);
        }
    }

    /// Returns true when playback just reached its natural end.
    pub fn poll_playback(&mut self) -> bool {
        self.player.poll_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedbackConfig;
    use crate::content::TextGenerator;
    use crate::error::ContentError;
    use crate::player::tests::{FakeOutput, FakeSynth};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    struct EchoText;

    #[async_trait]
    impl TextGenerator for EchoText {
        async fn fetch_chapter_text(
            &self,
            book: &str,
            chapter: u32,
        ) -> Result<String, ContentError> {
            Ok(format!("{book} 第 {chapter} 章"))
        }
    }

    struct Harness {
        app: ReaderApp,
        output: Arc<FakeOutput>,
        synth: Arc<FakeSynth>,
        dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let output = Arc::new(FakeOutput::default());
        let synth = Arc::new(FakeSynth::default());
        let app = ReaderApp::new(
            Selection::default(),
            ContentLoader::new(Arc::new(EchoText)),
            PlaybackController::new(output.clone(), synth.clone()),
            ProgressStore::new(dir.path().join("bible-progress.json")),
            Notifier::new(&FeedbackConfig {
                notifications: false,
                haptics: false,
            }),
        );
        Harness {
            app,
            output,
            synth,
            dir,
        }
    }

    async fn run(app: &mut ReaderApp, effect: Option<Effect>) {
        match effect {
            Some(Effect::Fetch(job)) => {
                app.on_fetched(job.run().await);
            }
            Some(Effect::Synthesize(job)) => app.on_synthesized(job.run().await),
            None => {}
        }
    }

    fn fetch(effect: Option<Effect>) -> FetchJob {
        match effect {
            Some(Effect::Fetch(job)) => job,
            _ => panic!("expected a fetch"),
        }
    }

    #[tokio::test]
    async fn marking_genesis_three_twice_round_trips() {
        let mut h = harness();
        let start = h.app.start();
        run(&mut h.app, Some(start)).await;
        let effect = h.app.handle(Command::Chapter(3));
        run(&mut h.app, effect).await;

        h.app.handle(Command::Mark(None));
        assert_eq!(h.app.progress().chapters("genesis"), &[3]);
        h.app.handle(Command::Mark(None));
        assert!(h.app.progress().chapters("genesis").is_empty());
    }

    #[tokio::test]
    async fn progress_is_saved_on_every_toggle() {
        let mut h = harness();
        h.app.toggle_completed(5);
        let reloaded = ProgressStore::new(h.dir.path().join("bible-progress.json")).load();
        assert_eq!(reloaded.chapters("genesis"), &[5]);
    }

    #[tokio::test]
    async fn stale_fetch_never_overwrites_newer_selection() {
        let mut h = harness();
        let x = fetch(h.app.select_chapter(10));
        let y = fetch(h.app.select_chapter(11));

        let y_done = y.run().await;
        let x_done = x.run().await;
        assert!(h.app.on_fetched(y_done));
        assert!(!h.app.on_fetched(x_done));

        assert_eq!(h.app.content().display_text(), Some("創世記 第 11 章"));
    }

    #[tokio::test]
    async fn play_during_load_makes_no_sound() {
        let mut h = harness();
        let pending = h.app.start();
        assert!(h.app.handle(Command::Play).is_none());
        assert_eq!(h.app.audio_state(), AudioState::Idle);

        run(&mut h.app, Some(pending)).await;
        assert_eq!(h.synth.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.output.started(), 0);
    }

    #[tokio::test]
    async fn switching_chapter_while_playing_goes_idle_before_loading() {
        let mut h = harness();
        let start = h.app.start();
        run(&mut h.app, Some(start)).await;
        let effect = h.app.handle(Command::Play);
        run(&mut h.app, effect).await;
        assert_eq!(h.app.audio_state(), AudioState::Playing);

        let job = fetch(h.app.handle(Command::Chapter(2)));
        assert_eq!(h.app.audio_state(), AudioState::Idle);
        assert!(h.app.content().is_loading());
        assert_eq!(h.output.live_handles(), 0);

        h.app.on_fetched(job.run().await);
        assert_eq!(h.app.audio_state(), AudioState::Idle);
    }

    #[tokio::test]
    async fn switching_chapter_while_paused_stops_the_paused_handle() {
        let mut h = harness();
        let start = h.app.start();
        run(&mut h.app, Some(start)).await;
        let effect = h.app.handle(Command::Play);
        run(&mut h.app, effect).await;
        assert!(h.app.handle(Command::Pause).is_none());
        assert_eq!(h.app.audio_state(), AudioState::Paused);

        let job = fetch(h.app.handle(Command::Chapter(2)));
        assert_eq!(h.app.audio_state(), AudioState::Idle);
        assert_eq!(h.output.probe(0).stopped.load(Ordering::SeqCst), 1);

        h.app.on_fetched(job.run().await);
        assert_eq!(h.app.audio_state(), AudioState::Idle);
        assert_eq!(h.output.started(), 1);
    }

    #[tokio::test]
    async fn navigating_after_failed_synthesis_clears_error() {
        let mut h = harness();
        let start = h.app.start();
        run(&mut h.app, Some(start)).await;
        h.synth.fail.store(true, Ordering::SeqCst);
        let effect = h.app.play();
        run(&mut h.app, effect).await;
        assert_eq!(h.app.audio_state(), AudioState::Error);

        let job = fetch(h.app.handle(Command::Next));
        assert_eq!(h.app.audio_state(), AudioState::Idle);
        assert_eq!(h.app.selection().chapter(), 2);

        h.app.on_fetched(job.run().await);
        assert_eq!(h.app.audio_state(), AudioState::Idle);
        assert_eq!(h.output.started(), 0);
    }

    #[tokio::test]
    async fn synthesis_finishing_after_chapter_change_is_dropped() {
        let mut h = harness();
        let start = h.app.start();
        run(&mut h.app, Some(start)).await;

        let Some(Effect::Synthesize(synth_job)) = h.app.play() else {
            panic!("expected synthesis");
        };
        let _ = h.app.select_chapter(2);
        h.app.on_synthesized(synth_job.run().await);

        assert_eq!(h.app.audio_state(), AudioState::Idle);
        assert_eq!(h.output.started(), 0);
    }

    #[tokio::test]
    async fn tapping_current_chapter_toggles_playback() {
        let mut h = harness();
        let start = h.app.start();
        run(&mut h.app, Some(start)).await;

        let effect = h.app.handle(Command::Chapter(1));

        run(&mut h.app, effect).await;
        assert_eq!(h.app.audio_state(), AudioState::Playing);

        assert!(h.app.handle(Command::Chapter(1)).is_none());
        assert_eq!(h.app.audio_state(), AudioState::Idle);
    }

    #[tokio::test]
    async fn synthesis_failure_then_retry_plays() {
        let mut h = harness();
        let start = h.app.start();
        run(&mut h.app, Some(start)).await;

        h.synth.fail.store(true, Ordering::SeqCst);
        let effect = h.app.play();
        run(&mut h.app, effect).await;
        assert_eq!(h.app.audio_state(), AudioState::Error);

        h.synth.fail.store(false, Ordering::SeqCst);
        let effect = h.app.play();
        assert_eq!(h.app.audio_state(), AudioState::Loading);
        run(&mut h.app, effect).await;
        assert_eq!(h.app.audio_state(), AudioState::Playing);
    }

    #[tokio::test]
    async fn natural_end_returns_to_idle() {
        let mut h = harness();
        let start = h.app.start();
        run(&mut h.app, Some(start)).await;
        let effect = h.app.play();
        run(&mut h.app, effect).await;

        assert!(!h.app.poll_playback());
        h.output.probe(0).finished.store(true, Ordering::SeqCst);
        assert!(h.app.poll_playback());
        assert_eq!(h.app.audio_state(), AudioState::Idle);
    }

    #[tokio::test]
    async fn opening_a_book_resets_to_chapter_one_and_fetches() {
        let mut h = harness();
        h.app.handle(Command::Search("約翰".into()));
        assert!(h.app.selection().sidebar_open());

        let job = fetch(h.app.handle(Command::OpenBook("john".into())));
        assert_eq!(h.app.selection().chapter(), 1);
        assert!(!h.app.selection().sidebar_open());
        h.app.on_fetched(job.run().await);
        assert_eq!(h.app.content().display_text(), Some("約翰福音 第 1 章"));
    }

    #[tokio::test]
    async fn view_shows_header_badges_and_strip_marks() {
        let mut h = harness();
        let start = h.app.start();
        assert!(crate::view::render(&h.app).contains("░░░"));
        run(&mut h.app, Some(start)).await;
        h.app.toggle_completed(2);
        h.app.handle(Command::Sidebar(true));

        let screen = crate::view::render(&h.app);
        assert!(screen.contains("創世記 第 1 章"));
        assert!(screen.contains("已讀 1 / 50 章"));
        assert!(screen.contains("[1]"));
        assert!(screen.contains(" 2✔ "));
        assert!(screen.contains("舊約聖經"));
        assert!(!screen.contains("░░░"));
    }

    #[test]
    fn navigation_past_book_end_does_nothing() {
        let mut h = harness();
        assert!(h.app.handle(Command::Previous).is_none());
        assert!(h.app.handle(Command::OpenBook("nowhere".into())).is_none());
        assert!(h.app.handle(Command::Chapter(99)).is_none());
    }
}
