//! Speech synthesis pipeline: text → encoded payload → raw bytes → playable buffer.
//!
//! The remote service returns base64 of headerless PCM (signed 16-bit
//! little-endian). Decoding is local and uses the layout the synthesizer
//! declares for its payload. Any stage failing yields one `SynthesisError`.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::audio::{PlayableBuffer, StreamFormat};
use crate::error::SynthesisError;

/// Layout of the PCM returned by the speech service.
pub const SPEECH_PCM_FORMAT: StreamFormat = StreamFormat {
    sample_rate: 24000,
    channels: 1,
};

/// Remote text-to-speech service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns the audio in its transport encoding (base64).
    async fn generate_speech(&self, text: &str) -> Result<String, SynthesisError>;

    fn payload_format(&self) -> StreamFormat {
        SPEECH_PCM_FORMAT
    }
}

pub fn decode_payload(payload: &str) -> Result<Vec<u8>, SynthesisError> {
    Ok(STANDARD.decode(payload.trim())?)
}

pub fn decode_audio(bytes: &[u8], format: StreamFormat) -> Result<PlayableBuffer, SynthesisError> {
    if !format.is_valid() {
        return Err(SynthesisError::Decode(format!("invalid format {format:?}")));
    }
    if bytes.is_empty() {
        return Err(SynthesisError::Decode("empty audio".into()));
    }
    if bytes.len() % 2 != 0 {
        return Err(SynthesisError::Decode(format!(
            "odd byte count {} for 16-bit PCM",
            bytes.len()
        )));
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    if samples.len() % format.channels as usize != 0 {
        return Err(SynthesisError::Decode(format!(
            "{} samples do not divide into {} channels",
            samples.len(),
            format.channels
        )));
    }

    Ok(PlayableBuffer { samples, format })
}

/// One synthesis attempt, run off the state-owning task.
pub struct SynthesisJob {
    pub(crate) token: u64,
    pub(crate) text: String,
    pub(crate) synthesizer: Arc<dyn SpeechSynthesizer>,
    pub(crate) format: StreamFormat,
}

impl SynthesisJob {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub async fn run(self) -> SynthesisOutcome {
        let t0 = Instant::now();
        let result = synthesize(self.synthesizer.as_ref(), &self.text, self.format).await;
        if let Ok(buffer) = &result {
            debug!(
                "Synthesized {:.1}s of audio in {}ms",
                buffer.duration().as_secs_f64(),
                t0.elapsed().as_millis()
            );
        }
        SynthesisOutcome {
            token: self.token,
            result,
        }
    }
}

#[derive(Debug)]
pub struct SynthesisOutcome {
    pub token: u64,
    pub result: Result<PlayableBuffer, SynthesisError>,
}

async fn synthesize(
    synthesizer: &dyn SpeechSynthesizer,
    text: &str,
    format: StreamFormat,
) -> Result<PlayableBuffer, SynthesisError> {
    let payload = synthesizer.generate_speech(text).await?;
    let bytes = decode_payload(&payload)?;
    decode_audio(&bytes, format)
}
