//! Playback controller state machine.
//!
//! IDLE → LOADING → PLAYING ⇄ PAUSED → IDLE, with LOADING → ERROR on any
//! pipeline failure. At most one handle exists at a time, and each attempt
//! carries a token so a synthesis result that arrives after `stop()` or a
//! newer `play()` is dropped without making a sound.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::audio::{AudioOutput, PlaybackHandle};
use crate::error::PlaybackError;
use crate::speech::{SpeechSynthesizer, SynthesisJob, SynthesisOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

impl std::fmt::Display for AudioState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Loading => write!(f, "LOADING"),
            Self::Playing => write!(f, "PLAYING"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

pub struct PlaybackController {
    output: Arc<dyn AudioOutput>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    state: AudioState,
    handle: Option<Box<dyn PlaybackHandle>>,
    attempt: u64,
}

impl PlaybackController {
    pub fn new(output: Arc<dyn AudioOutput>, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            output,
            synthesizer,
            state: AudioState::Idle,
            handle: None,
            attempt: 0,
        }
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    #[cfg(test)]
    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    fn transition(&mut self, next: AudioState) {
        if self.state != next {
            info!("Audio: {} → {}", self.state, next);
            self.state = next;
        }
    }

    /// Request playback of `text`.
    ///
    /// Returns the synthesis job to run, or `None` when there is nothing to
    /// synthesize: no text, an attempt already loading, or a paused handle
    /// that was resumed in place.
    pub fn play(&mut self, text: Option<&str>) -> Result<Option<SynthesisJob>, PlaybackError> {
        if self.state == AudioState::Paused {
            if let Some(handle) = self.handle.as_mut() {
                handle.resume();
                self.transition(AudioState::Playing);
                return Ok(None);
            }
        }

        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            debug!("play() ignored: no chapter text loaded");
            return Ok(None);
        };
        if self.state == AudioState::Loading {
            debug!("play() ignored: already loading");
            return Ok(None);
        }

        self.transition(AudioState::Loading);
        if let Err(e) = self.output.resume() {
            self.fail(&e);
            return Err(e);
        }

        self.attempt += 1;
        Ok(Some(SynthesisJob {
            token: self.attempt,
            text: text.to_string(),
            synthesizer: Arc::clone(&self.synthesizer),
            format: self.synthesizer.payload_format(),
        }))
    }

    /// Finish an attempt started by `play()`.
    ///
    /// Stale outcomes are ignored and return `Ok`. A failure leaves the
    /// controller in `Error` with no handle and is returned for the caller
    /// to report.
    pub fn complete(&mut self, outcome: SynthesisOutcome) -> Result<(), PlaybackError> {
        if outcome.token != self.attempt || self.state != AudioState::Loading {
            debug!(
                "Discarding synthesis result (token {}, current {}, state {})",
                outcome.token, self.attempt, self.state
            );
            return Ok(());
        }

        let buffer = match outcome.result {
            Ok(buffer) => buffer,
            Err(e) => {
                let e = PlaybackError::from(e);
                self.fail(&e);
                return Err(e);
            }
        };

        self.release_handle();
        match self.output.start(buffer) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.transition(AudioState::Playing);
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Stop any playback and return to `Idle`. Idempotent.
    pub fn stop(&mut self) {
        // Invalidate any attempt still synthesizing
        self.attempt += 1;
        self.release_handle();
        self.transition(AudioState::Idle);
    }

    pub fn pause(&mut self) {
        if self.state != AudioState::Playing {
            return;
        }
        if let Some(handle) = self.handle.as_mut() {
            handle.pause();
            self.transition(AudioState::Paused);
        }
    }

    /// Detect natural end of playback. Returns true when it just ended.
    pub fn poll_finished(&mut self) -> bool {
        if self.state != AudioState::Playing {
            return false;
        }
        let finished = self.handle.as_ref().map_or(true, |h| h.is_finished());
        if finished {
            debug!("Playback reached natural end");
            self.handle = None;
            self.transition(AudioState::Idle);
        }
        finished
    }

    fn release_handle(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
        }
    }

    fn fail(&mut self, error: &PlaybackError) {
        warn!("Playback failed: {error}");
        self.release_handle();
        self.transition(AudioState::Error);
    }
}
