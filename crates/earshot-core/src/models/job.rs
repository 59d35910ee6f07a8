//! Analysis job records and result items.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::CHAT_MESSAGE_LIMIT;
use crate::models::transcription::TranscriptionResult;

/// Lifecycle state of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Error,
}

/// Caller subscription tier, derived from the `has_subscription` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Free,
    Subscriber,
}

impl From<bool> for Tier {
    fn from(has_subscription: bool) -> Self {
        if has_subscription {
            Tier::Subscriber
        } else {
            Tier::Free
        }
    }
}

/// Count and share of clips in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClipBreakdown {
    pub count: u64,
    pub percentage: f64,
}

/// Breakdown of detected speech clips by origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpeechClips {
    pub count: u64,
    pub percentage: f64,
    pub ai_clips: ClipBreakdown,
    pub human_clips: ClipBreakdown,
}

/// Aggregate statistics over all analyzed chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummaryStatistics {
    pub total_clips: u64,
    pub speech_clips: SpeechClips,
}

/// Per-chunk detection verdict on the analysis timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TimelineEntry {
    /// Offset in seconds from the start of the audio.
    pub timestamp: u64,
    pub confidence: f64,
    pub prediction: String,
}

/// One item of the result sequence: exactly one summary item first,
/// then one timeline entry per chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ResultItem {
    Summary {
        summary_statistics: SummaryStatistics,
    },
    Timeline(TimelineEntry),
}

impl ResultItem {
    pub fn is_timeline(&self) -> bool {
        matches!(self, ResultItem::Timeline(_))
    }
}

/// Stored record of one analysis job, keyed by task id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Job {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<ResultItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_prediction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_data: Option<TranscriptionResult>,
    #[serde(default)]
    pub chat_message_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Fresh record written when a report is dispatched.
    pub fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            result: None,
            overall_prediction: None,
            aggregate_confidence: None,
            transcription_data: None,
            chat_message_count: 0,
            error: None,
        }
    }
}

/// Client-facing view of a job after tier projection.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct JobView {
    pub status: JobStatus,
    pub result: Option<Vec<ResultItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_prediction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_confidence: Option<f64>,
    pub transcription_data: Option<TranscriptionResult>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_limited: Option<bool>,
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        Self {
            status: job.status,
            result: job.result,
            overall_prediction: job.overall_prediction,
            aggregate_confidence: job.aggregate_confidence,
            transcription_data: job.transcription_data,
            error: job.error,
            is_limited: None,
        }
    }
}

/// Chat quota usage for one report.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChatUsage {
    pub message_count: u32,
    pub limit: u32,
    pub remaining: u32,
}

impl ChatUsage {
    pub fn from_count(message_count: u32) -> Self {
        Self {
            message_count,
            limit: CHAT_MESSAGE_LIMIT,
            remaining: CHAT_MESSAGE_LIMIT.saturating_sub(message_count),
        }
    }
}
