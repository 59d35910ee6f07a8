//! Shared constants for upload limits, job processing, and chat quotas.

/// Maximum accepted audio upload size in bytes (40 MB).
pub const MAX_UPLOAD_BYTES: usize = 40 * 1024 * 1024;

/// File extensions accepted for audio uploads (lowercase, no leading dot).
pub const ALLOWED_AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a"];

/// Content types accepted for audio uploads.
pub const ALLOWED_AUDIO_CONTENT_TYPES: &[&str] =
    &["audio/mpeg", "audio/mp3", "audio/wav", "audio/x-wav"];

/// Validity window of a signed upload URL in seconds.
pub const UPLOAD_URL_TTL_SECS: u64 = 10;

/// Maximum age of an uploaded object before report dispatch rejects it as stale.
/// Objects older than this were not uploaded through a freshly issued grant.
pub const UPLOAD_FRESHNESS_WINDOW_SECS: i64 = 60;

/// Deadline for queue delivery of a dispatched analysis task.
pub const DISPATCH_DEADLINE_SECS: u64 = 300;

/// Default lifetime of an issued auth token.
pub const TOKEN_TTL_SECS: u64 = 3600;

/// Duration in seconds of one analysis chunk; timeline timestamps advance by this stride.
pub const CHUNK_STRIDE_SECS: u64 = 3;

/// Maximum chat messages per analyzed report.
pub const CHAT_MESSAGE_LIMIT: u32 = 10;

/// Free-tier word cap on the synchronous transcription endpoint.
pub const FREE_TIER_WORD_LIMIT: usize = 50;

/// Default transcript text when no transcription is available.
pub const DEFAULT_TRANSCRIPT_TEXT: &str = "No transcription available.";

/// Default summary text when no summary is available.
pub const DEFAULT_SUMMARY_TEXT: &str = "No summary available.";

/// Queue-origin headers attached to every task delivery.
pub const TASK_NAME_HEADER: &str = "X-Task-Name";
pub const QUEUE_NAME_HEADER: &str = "X-Queue-Name";
pub const QUEUE_SIGNATURE_HEADER: &str = "X-Queue-Signature";

/// Worker trigger path the queue delivers tasks to.
pub const PROCESS_REPORT_PATH: &str = "/process-report";

/// System context prepended to every chat conversation.
pub const INITIAL_CHAT_CONTEXT: &str = "\
You are Earshot, an AI assistant focused on helping users understand AI-generated content and audio.

You are knowledgeable about AI detection, audio analysis, and content generation.

You should be helpful, friendly, and direct in your responses.

When discussing AI detection, focus on education rather than evasion.

If you're unsure about something, be honest about your limitations.

You will be given the results of an audio analysis and you will need to discuss them with the user.
";
