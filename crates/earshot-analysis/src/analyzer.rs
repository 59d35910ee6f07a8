//! Audio analyzer capability.
//!
//! The detection model runs behind an inference service; this module defines the
//! capability trait the rest of the system depends on and the HTTP-backed
//! implementation used in deployment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use earshot_core::constants::CHUNK_STRIDE_SECS;
use earshot_core::models::{ClipBreakdown, SpeechClips, SummaryStatistics, TimelineEntry};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Analysis service error: {0}")]
    Service(String),

    #[error("Analysis request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed analysis response: {0}")]
    InvalidResponse(String),
}

/// Chunked detection output for one audio file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub total_chunks: u64,
    pub ai_chunks: u64,
    pub human_chunks: u64,
    pub percent_ai: f64,
    pub percent_human: f64,
    /// Per-chunk verdicts, one per chunk in order.
    pub predictions: Vec<String>,
    /// Per-chunk confidences, same length as `predictions`.
    pub confidences: Vec<f64>,
    pub overall_prediction: String,
    pub aggregate_confidence: f64,
}

impl AnalysisOutcome {
    /// One timeline entry per chunk, timestamps advancing by the chunk stride.
    pub fn timeline_entries(&self) -> Vec<TimelineEntry> {
        self.confidences
            .iter()
            .enumerate()
            .map(|(i, &confidence)| TimelineEntry {
                timestamp: i as u64 * CHUNK_STRIDE_SECS,
                confidence,
                prediction: self
                    .predictions
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
            })
            .collect()
    }

    /// Aggregate statistics item placed at the head of the result sequence.
    pub fn summary_statistics(&self) -> SummaryStatistics {
        SummaryStatistics {
            total_clips: self.total_chunks,
            speech_clips: SpeechClips {
                count: self.total_chunks,
                percentage: 100.0,
                ai_clips: ClipBreakdown {
                    count: self.ai_chunks,
                    percentage: self.percent_ai,
                },
                human_clips: ClipBreakdown {
                    count: self.human_chunks,
                    percentage: self.percent_human,
                },
            },
        }
    }
}

/// Capability for running chunked AI-speech detection over audio bytes.
#[async_trait]
pub trait AudioAnalyzer: Send + Sync {
    async fn analyze(&self, audio: &[u8], filename: &str) -> Result<AnalysisOutcome, AnalysisError>;
}

/// Inference-service response envelope. `status = "error"` carries a message
/// instead of results.
#[derive(Debug, Deserialize)]
struct InferenceEnvelope {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    outcome: Option<AnalysisOutcome>,
}

/// `AudioAnalyzer` backed by an HTTP inference service.
pub struct HttpAudioAnalyzer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAudioAnalyzer {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl AudioAnalyzer for HttpAudioAnalyzer {
    #[tracing::instrument(skip(self, audio), fields(filename = %filename, bytes = audio.len()))]
    async fn analyze(&self, audio: &[u8], filename: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/octet-stream")
            .header("X-File-Name", filename)
            .body(audio.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Service(format!(
                "inference service returned {}: {}",
                status, body
            )));
        }

        let envelope: InferenceEnvelope = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

        if envelope.status == "error" {
            return Err(AnalysisError::Service(
                envelope
                    .error
                    .unwrap_or_else(|| "Unknown error during audio analysis".to_string()),
            ));
        }

        envelope
            .outcome
            .ok_or_else(|| AnalysisError::InvalidResponse("missing analysis fields".to_string()))
    }
}
