//! Canonical transcription types
//!
//! Every provider response shape is normalized into `TranscriptionResult` before it
//! leaves the analysis layer; downstream code never sees provider-specific structure.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::{DEFAULT_SUMMARY_TEXT, DEFAULT_TRANSCRIPT_TEXT};

/// A single word with timing and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WordTiming {
    pub word: String,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    pub confidence: f64,
}

/// Averaged sentiment across the whole transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SentimentSummary {
    pub sentiment: String,
    pub sentiment_score: f64,
}

impl Default for SentimentSummary {
    fn default() -> Self {
        Self {
            sentiment: "neutral".to_string(),
            sentiment_score: 0.0,
        }
    }
}

/// Canonical transcription output. Each field defaults independently:
/// partial provider data in one field never blanks another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TranscriptionResult {
    pub text: String,
    pub words: Vec<WordTiming>,
    pub average_sentiment: SentimentSummary,
    pub summary: String,
    /// Set only when a transport-level fault was converted into the default shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when words were truncated for a free-tier caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_limited: Option<bool>,
}

impl Default for TranscriptionResult {
    fn default() -> Self {
        Self {
            text: DEFAULT_TRANSCRIPT_TEXT.to_string(),
            words: Vec::new(),
            average_sentiment: SentimentSummary::default(),
            summary: DEFAULT_SUMMARY_TEXT.to_string(),
            error: None,
            is_limited: None,
        }
    }
}

impl TranscriptionResult {
    /// Default shape carrying a transport fault message.
    pub fn from_fault(message: impl Into<String>) -> Self {
        Self {
            text: "Transcription failed.".to_string(),
            summary: "No summary available due to transcription error.".to_string(),
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_neutral_sentiment_and_placeholder_text() {
        let result = TranscriptionResult::default();
        assert_eq!(result.text, "No transcription available.");
        assert_eq!(result.average_sentiment.sentiment, "neutral");
        assert!(result.words.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn fault_shape_carries_error_and_stays_serializable() {
        let result = TranscriptionResult::from_fault("connection refused");
        assert_eq!(result.error.as_deref(), Some("connection refused"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["text"], "Transcription failed.");
    }
}
