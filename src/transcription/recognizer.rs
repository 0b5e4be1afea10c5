//! Speech recognizer abstraction and the Google Speech-to-Text client.
//!
//! A recognizer transcribes one window of raw PCM and returns ranked
//! alternatives, best first. An empty list means nothing was heard.

use crate::config::AppConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe one window. Alternatives are ranked best first.
    async fn recognize(&self, window: &[u8]) -> Result<Vec<String>>;

    fn name(&self) -> &str;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    audio_channel_count: u8,
    language_code: &'a str,
    max_alternatives: u32,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

/// Build the ranked transcripts of a whole window.
///
/// Google splits longer audio into consecutive results, each with its own
/// alternatives. Rank `k` joins every result's `k`-th alternative, falling
/// back to a result's best one when it has fewer than `k + 1`.
fn rank_alternatives(results: &[SpeechResult]) -> Vec<String> {
    let results: Vec<&SpeechResult> = results.iter().filter(|r| !r.alternatives.is_empty()).collect();
    let ranks = results.iter().map(|r| r.alternatives.len()).max().unwrap_or(0);

    (0..ranks)
        .map(|rank| {
            results
                .iter()
                .map(|r| r.alternatives.get(rank).unwrap_or(&r.alternatives[0]).transcript.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

pub struct GoogleSpeechRecognizer {
    api_key: String,
    endpoint: String,
    language: String,
    sample_rate: u32,
    channels: u8,
    max_alternatives: u32,
    client: reqwest::Client,
}

impl GoogleSpeechRecognizer {
    pub fn from_config(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: config.services.google_api_key.trim().to_string(),
            endpoint: config.services.speech_endpoint.trim_end_matches('/').to_string(),
            language: config.models.speech_language.clone(),
            sample_rate: config.audio.sample_rate,
            channels: config.audio.channels,
            max_alternatives: config.models.max_alternatives.max(1),
            client,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechRecognizer {
    async fn recognize(&self, window: &[u8]) -> Result<Vec<String>> {
        if self.api_key.is_empty() {
            return Err(anyhow!("GOOGLE_API_KEY is not configured"));
        }

        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: self.sample_rate,
                audio_channel_count: self.channels,
                language_code: &self.language,
                max_alternatives: self.max_alternatives,
            },
            audio: RecognitionAudio {
                content: general_purpose::STANDARD.encode(window),
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/speech:recognize?key={}", self.endpoint, self.api_key))
            .json(&body)
            .send()
            .await
            .context("Speech request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Speech API returned {}: {}", status, detail));
        }

        let parsed: RecognizeResponse = response.json().await.context("Unexpected Speech API response")?;
        let ranked = rank_alternatives(&parsed.results);
        tracing::debug!(bytes = window.len(), alternatives = ranked.len(), "Window recognized");
        Ok(ranked)
    }

    fn name(&self) -> &str {
        "google-speech"
    }
}
