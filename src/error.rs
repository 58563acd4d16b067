//! Error types for the remote collaborators and the audio pipeline.
//!
//! None of these are fatal to the process: callers log them and degrade
//! the affected feature.

use thiserror::Error;

/// Failure to obtain chapter text.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("text service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("text service returned no chapter text")]
    Empty,
}

/// Any failure along text → payload → raw bytes → playable buffer.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("speech service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("speech service response has no audio payload")]
    MissingPayload,
    #[error("malformed audio payload: {0}")]
    Payload(#[from] base64::DecodeError),
    #[error("cannot decode audio: {0}")]
    Decode(String),
}

/// Failure to open the output device or start a playback handle.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to open audio output: {0}")]
    Output(String),
    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}
