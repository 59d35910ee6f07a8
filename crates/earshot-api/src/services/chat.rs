//! Chat assistant backed by a hosted generative model.
//!
//! The conversation context travels with the client: each response returns the
//! accumulated context string, and the client sends it back with the next
//! message. Analysis results are folded into the prompt so the model can
//! answer questions about a specific report.

use async_trait::async_trait;
use serde_json::Value;

use earshot_core::constants::INITIAL_CHAT_CONTEXT;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat service error: {0}")]
    Service(String),

    #[error("malformed chat response: {0}")]
    Malformed(String),
}

/// Generates one completion for an assembled prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;
}

/// Client for a Gemini-style `generateContent` endpoint.
pub struct HttpChatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpChatModel {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ChatError::Service(format!("{}: {}", status, detail)));
        }

        let value: Value = response.json().await?;
        value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ChatError::Malformed("no completion text in response".to_string()))
    }
}

/// Merge the client-supplied context with the system context, deduplicating
/// the system preamble if the client echoed it back.
pub fn current_context(client_context: Option<&str>) -> String {
    match client_context {
        Some(context) if context != INITIAL_CHAT_CONTEXT => {
            let history = context.replace(INITIAL_CHAT_CONTEXT, "");
            let history = history.trim();
            if history.is_empty() {
                INITIAL_CHAT_CONTEXT.to_string()
            } else {
                format!("{}\n\n{}", INITIAL_CHAT_CONTEXT, history)
            }
        }
        _ => INITIAL_CHAT_CONTEXT.to_string(),
    }
}

fn format_analysis(analysis_data: &Value) -> String {
    let file_name = analysis_data["fileName"].as_str().unwrap_or("Unknown");
    let overall = match &analysis_data["overallPrediction"] {
        Value::String(s) => s.clone(),
        Value::Null => "Unknown".to_string(),
        other => other.to_string(),
    };
    let confidence = match &analysis_data["aggregateConfidence"] {
        Value::Null => "Unknown".to_string(),
        other => other.to_string(),
    };

    let chunks = analysis_data["chunkResults"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    let mut out = format!(
        "\n\nANALYSIS RESULTS:\nFile: {}\nOverall Prediction: {}\nAggregate Confidence: {}\n\nCHUNK ANALYSIS:\nTotal Chunks: {}\n",
        file_name,
        overall,
        confidence,
        chunks.len()
    );

    if !chunks.is_empty() {
        out.push_str("Detailed Results:\n");
        // First ten chunks only, to stay within token limits.
        for (i, chunk) in chunks.iter().take(10).enumerate() {
            let timestamp = chunk["timestamp"].as_u64().unwrap_or(i as u64 * 3);
            let prediction = chunk["prediction"].as_str().unwrap_or("Unknown");
            let confidence = match &chunk["confidence"] {
                Value::Null => "Unknown".to_string(),
                other => other.to_string(),
            };
            out.push_str(&format!(
                "- Timestamp {}s: {} (confidence: {})\n",
                timestamp,
                prediction.to_uppercase(),
                confidence
            ));
        }
        if chunks.len() > 10 {
            out.push_str(&format!("... and {} more chunks\n", chunks.len() - 10));
        }
    }

    let transcript = match &analysis_data["transcriptionData"] {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("transcript"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    if let Some(text) = transcript.filter(|t| !t.is_empty()) {
        let excerpt: String = text.chars().take(1000).collect();
        let ellipsis = if text.chars().count() > 1000 { "..." } else { "" };
        out.push_str(&format!("\nTRANSCRIPTION:\n{}{}\n", excerpt, ellipsis));
    }

    out.push_str("\nPlease use this analysis data to answer questions about the audio file.\n");
    out
}

/// Assemble the full prompt: system context, optional analysis results, and
/// the new user message.
pub fn build_prompt(message: &str, context: &str, analysis_data: Option<&Value>) -> String {
    let analysis_context = analysis_data.map(format_analysis).unwrap_or_default();
    format!("{}{}\n\nNew message:\n{}", context, analysis_context, message)
}

/// Extend the conversation context with the latest exchange.
pub fn extend_context(context: &str, message: &str, reply: &str) -> String {
    format!("{}\nUser: {}\nAssistant: {}", context, message, reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_without_history_is_just_the_system_preamble() {
        assert_eq!(current_context(None), INITIAL_CHAT_CONTEXT);
        assert_eq!(
            current_context(Some(INITIAL_CHAT_CONTEXT)),
            INITIAL_CHAT_CONTEXT
        );
    }

    #[test]
    fn echoed_preamble_is_not_duplicated() {
        let client_context = format!("{}\nUser: hi\nAssistant: hello", INITIAL_CHAT_CONTEXT);
        let merged = current_context(Some(&client_context));
        assert_eq!(merged.matches("You are Earshot").count(), 1);
        assert!(merged.contains("User: hi"));
    }

    #[test]
    fn prompt_includes_analysis_summary_and_chunk_lines() {
        let analysis = serde_json::json!({
            "fileName": "clip.mp3",
            "overallPrediction": "AI",
            "aggregateConfidence": 0.92,
            "chunkResults": [
                { "timestamp": 0, "prediction": "ai", "confidence": 0.95 },
                { "timestamp": 3, "prediction": "human", "confidence": 0.6 },
            ],
        });
        let prompt = build_prompt("what is this?", INITIAL_CHAT_CONTEXT, Some(&analysis));
        assert!(prompt.contains("File: clip.mp3"));
        assert!(prompt.contains("Overall Prediction: AI"));
        assert!(prompt.contains("Total Chunks: 2"));
        assert!(prompt.contains("- Timestamp 0s: AI (confidence: 0.95)"));
        assert!(prompt.contains("- Timestamp 3s: HUMAN (confidence: 0.6)"));
        assert!(prompt.ends_with("New message:\nwhat is this?"));
    }

    #[test]
    fn long_chunk_lists_are_elided_after_ten() {
        let chunks: Vec<_> = (0..14)
            .map(|i| {
                serde_json::json!({ "timestamp": i * 3, "prediction": "ai", "confidence": 0.9 })
            })
            .collect();
        let analysis = serde_json::json!({ "chunkResults": chunks });
        let prompt = build_prompt("q", INITIAL_CHAT_CONTEXT, Some(&analysis));
        assert!(prompt.contains("... and 4 more chunks"));
        assert!(!prompt.contains("Timestamp 30s"));
    }

    #[test]
    fn transcription_excerpt_is_capped_at_a_thousand_chars() {
        let long_text = "x".repeat(1500);
        let analysis = serde_json::json!({
            "chunkResults": [],
            "transcriptionData": { "text": long_text },
        });
        let prompt = build_prompt("q", INITIAL_CHAT_CONTEXT, Some(&analysis));
        assert!(prompt.contains(&format!("{}...", "x".repeat(1000))));
        assert!(!prompt.contains(&"x".repeat(1001)));
    }

    #[test]
    fn extend_context_appends_the_exchange() {
        let next = extend_context("ctx", "hi", "hello");
        assert_eq!(next, "ctx\nUser: hi\nAssistant: hello");
    }
}
