//! Gemini REST client for chapter text and speech.
//!
//! Both collaborators go through `generateContent`; the speech model is
//! asked for the AUDIO modality and answers with base64 PCM in
//! `inlineData`. Failures are returned as values, never retried.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::GeminiConfig;
use crate::content::TextGenerator;
use crate::error::{ContentError, SynthesisError};
use crate::speech::SpeechSynthesizer;

const CHAPTER_PROMPT: &str = "請提供聖經《{book}》第 {chapter} 章的完整經文（和合本繁體中文）。\
每節以節數開頭，各節獨立成行。只輸出經文本身，不要標題、註釋或任何說明。";

pub struct GeminiClient {
    config: GeminiConfig,
    api_key: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_key = config.resolve_api_key().unwrap_or_else(|| {
            warn!("No Gemini API key configured; chapter text and audio will be unavailable");
            String::new()
        });

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent",
            self.config.host.trim_end_matches('/')
        )
    }

    async fn generate(
        &self,
        model: &str,
        body: &Value,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn fetch_chapter_text(
        &self,
        book_name: &str,
        chapter: u32,
    ) -> Result<String, ContentError> {
        let t0 = Instant::now();
        let prompt = CHAPTER_PROMPT
            .replace("{book}", book_name)
            .replace("{chapter}", &chapter.to_string());

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let resp = self.generate(&self.config.text_model, &body).await?;
        if !resp.status().is_success() {
            return Err(ContentError::Status(resp.status()));
        }

        let data: Value = resp.json().await?;
        let text = response_text(&data);
        if text.is_empty() {
            return Err(ContentError::Empty);
        }

        info!(
            "Fetched {book_name} {chapter} ({} chars, {}ms)",
            text.chars().count(),
            t0.elapsed().as_millis()
        );
        Ok(text)
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiClient {
    async fn generate_speech(&self, text: &str) -> Result<String, SynthesisError> {
        let t0 = Instant::now();
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice }
                    }
                }
            }
        });

        let resp = self.generate(&self.config.tts_model, &body).await?;
        if !resp.status().is_success() {
            return Err(SynthesisError::Status(resp.status()));
        }

        let data: Value = resp.json().await?;
        let payload = data
            .pointer("/candidates/0/content/parts/0/inlineData/data")
            .and_then(Value::as_str)
            .ok_or(SynthesisError::MissingPayload)?;

        debug!(
            "Speech payload {} bytes in {}ms",
            payload.len(),
            t0.elapsed().as_millis()
        );
        Ok(payload.to_string())
    }
}

/// Concatenate every text part of the first candidate.
fn response_text(data: &Value) -> String {
    data.pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
        .trim()
        .to_string()
}
