//! Transcription provider capability and response shapes.
//!
//! A provider response arrives in one of three shapes: a typed payload nesting
//! `channels → alternatives → words`, a typed payload nesting `utterances → words`,
//! or a raw JSON document from the direct HTTP path. The shapes are an explicit
//! tagged union; the normalizer dispatches on the tag, never on field presence.

use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionFault {
    #[error("Transcription request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Transcription provider error: {0}")]
    Provider(String),

    #[error("Malformed transcription payload: {0}")]
    Malformed(String),
}

/// One recognized word as the provider reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub start: f64,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentInfo {
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sentiments {
    #[serde(default)]
    pub average: Option<SentimentInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryInfo {
    #[serde(default)]
    pub short: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub words: Vec<WordEntry>,
    #[serde(default)]
    pub sentiment: Option<SentimentInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Utterance {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub words: Vec<WordEntry>,
}

/// Payload nesting `channels → alternatives`. Providers sometimes attach
/// utterances alongside; they serve as the fallback when the channel
/// alternative is empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelsPayload {
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub utterances: Vec<Utterance>,
    #[serde(default)]
    pub sentiments: Option<Sentiments>,
    #[serde(default)]
    pub summary: Option<SummaryInfo>,
}

/// Payload carrying only utterances.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UtterancesPayload {
    #[serde(default)]
    pub utterances: Vec<Utterance>,
    #[serde(default)]
    pub sentiments: Option<Sentiments>,
    #[serde(default)]
    pub summary: Option<SummaryInfo>,
}

/// The three response shapes a transport can produce.
#[derive(Debug, Clone)]
pub enum ProviderResponse {
    Channels(ChannelsPayload),
    Utterances(UtterancesPayload),
    /// Raw JSON document from the direct HTTP path.
    Raw(serde_json::Value),
}

/// Capability for turning audio bytes into a provider response.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn transcribe(
        &self,
        audio: &[u8],
        content_type: &str,
    ) -> Result<ProviderResponse, TranscriptionFault>;
}

/// Direct-HTTP transcription transport. Returns the raw JSON document;
/// shape interpretation belongs to the normalizer.
pub struct HttpTranscriptionProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpTranscriptionProvider {
    pub fn new(url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        }
    }
}

#[async_trait]
impl TranscriptionProvider for HttpTranscriptionProvider {
    #[tracing::instrument(skip(self, audio), fields(bytes = audio.len(), content_type = %content_type))]
    async fn transcribe(
        &self,
        audio: &[u8],
        content_type: &str,
    ) -> Result<ProviderResponse, TranscriptionFault> {
        let response = self
            .client
            .post(&self.url)
            .query(&[
                ("model", "nova-2"),
                ("smart_format", "true"),
                ("diarize", "true"),
                ("summarize", "v2"),
                ("detect_language", "true"),
                ("utterances", "true"),
                ("detect_topics", "true"),
                ("sentiment", "true"),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", content_type)
            .body(audio.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionFault::Provider(format!(
                "provider returned status {}: {}",
                status, body
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranscriptionFault::Malformed(e.to_string()))?;

        Ok(ProviderResponse::Raw(value))
    }
}
