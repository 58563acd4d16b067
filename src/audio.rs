//! Audio output: the shared playback context and per-playback handles.
//!
//! The context opens the output device lazily on first use and keeps it for
//! the rest of the process. Each playback gets its own handle; stopping a
//! handle is idempotent and stopping one that already finished is a no-op.

use std::sync::Mutex;
use std::time::Duration;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, info};

use crate::config::AudioConfig;
use crate::error::PlaybackError;

/// Sample layout of a PCM stream or buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl StreamFormat {
    pub fn is_valid(&self) -> bool {
        self.sample_rate > 0 && self.channels > 0
    }
}

impl From<&AudioConfig> for StreamFormat {
    fn from(config: &AudioConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
        }
    }
}

/// Decoded audio ready to hand to an output.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayableBuffer {
    pub samples: Vec<f32>,
    pub format: StreamFormat,
}

impl PlayableBuffer {
    pub fn duration(&self) -> Duration {
        if !self.format.is_valid() {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as f64 / self.format.channels as f64;
        Duration::from_secs_f64(frames / self.format.sample_rate as f64)
    }
}

/// One in-flight audio rendering.
pub trait PlaybackHandle: Send {
    /// Stop output. Safe to call any number of times, before or after the end.
    fn stop(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn is_finished(&self) -> bool;
}

/// Process-wide playback context.
pub trait AudioOutput: Send + Sync {
    /// Make the device ready, opening it on first call.
    fn resume(&self) -> Result<(), PlaybackError>;

    /// Begin playing `buffer` from the start.
    fn start(&self, buffer: PlayableBuffer) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;
}

/// Default-device output backed by rodio.
///
/// `format` is the device stream layout; buffers in any other layout are
/// converted by the rodio mixer.
pub struct RodioOutput {
    format: StreamFormat,
    // Kept alive for process lifetime once opened
    stream: Mutex<Option<OutputStream>>,
}

impl RodioOutput {
    pub fn new(format: StreamFormat) -> Self {
        Self {
            format,
            stream: Mutex::new(None),
        }
    }
}

impl AudioOutput for RodioOutput {
    fn resume(&self) -> Result<(), PlaybackError> {
        let mut guard = self
            .stream
            .lock()
            .map_err(|_| PlaybackError::Output("audio context lock poisoned".into()))?;
        if guard.is_none() {
            let stream = OutputStreamBuilder::from_default_device()
                .map(|b| {
                    b.with_sample_rate(self.format.sample_rate)
                        .with_channels(self.format.channels)
                })
                .and_then(|b| b.open_stream_or_fallback())
                .map_err(|e| PlaybackError::Output(e.to_string()))?;
            info!(
                "Opened audio output ({} Hz, {} ch)",
                stream.config().sample_rate(),
                stream.config().channel_count()
            );
            *guard = Some(stream);
        }
        Ok(())
    }

    fn start(&self, buffer: PlayableBuffer) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        // SamplesBuffer asserts on a zero rate or channel count
        if !buffer.format.is_valid() {
            return Err(PlaybackError::Output(format!(
                "unplayable format {:?}",
                buffer.format
            )));
        }
        self.resume()?;
        let guard = self
            .stream
            .lock()
            .map_err(|_| PlaybackError::Output("audio context lock poisoned".into()))?;
        let stream = guard
            .as_ref()
            .ok_or_else(|| PlaybackError::Output("audio output not open".into()))?;

        // rodio 0.21: Sink::connect_new takes &Mixer
        let sink = Sink::connect_new(stream.mixer());
        debug!("Starting playback of {:.1}s", buffer.duration().as_secs_f64());
        sink.append(SamplesBuffer::new(
            buffer.format.channels,
            buffer.format.sample_rate,
            buffer.samples,
        ));
        Ok(Box::new(SinkHandle { sink: Some(sink) }))
    }
}

struct SinkHandle {
    sink: Option<Sink>,
}

impl PlaybackHandle for SinkHandle {
    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().map_or(true, |s| s.empty())
    }
}
