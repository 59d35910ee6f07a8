//! Normalizes any provider response shape into the canonical `TranscriptionResult`.
//!
//! Precedence: channel alternative transcript/words first, then utterances joined
//! with spaces and their concatenated words. Sentiment tries the alternative's own
//! sentiment before the document-level average; summary tries `short` before `text`.
//! Each field defaults independently, and transport faults become the canonical
//! default shape with `error` set — callers never receive an `Err`.

use earshot_core::models::{SentimentSummary, TranscriptionResult, WordTiming};

use crate::transcription::provider::{
    ChannelsPayload, ProviderResponse, SentimentInfo, SummaryInfo, TranscriptionProvider,
    Utterance, UtterancesPayload, WordEntry,
};

fn convert_words(words: &[WordEntry]) -> Vec<WordTiming> {
    words
        .iter()
        .map(|w| WordTiming {
            word: w.word.clone(),
            start: w.start,
            end: w.end.unwrap_or(w.start + 0.5),
            confidence: w.confidence.unwrap_or(1.0),
        })
        .collect()
}

fn fill_from_utterances(result: &mut TranscriptionResult, utterances: &[Utterance]) {
    let texts: Vec<&str> = utterances
        .iter()
        .filter_map(|u| u.transcript.as_deref())
        .collect();
    if !texts.is_empty() {
        result.text = texts.join(" ");
    }

    let words: Vec<WordTiming> = utterances
        .iter()
        .flat_map(|u| convert_words(&u.words))
        .collect();
    if !words.is_empty() {
        result.words = words;
    }
}

fn apply_sentiment(result: &mut TranscriptionResult, info: &SentimentInfo) {
    result.average_sentiment = SentimentSummary {
        sentiment: info
            .sentiment
            .clone()
            .unwrap_or_else(|| "neutral".to_string()),
        sentiment_score: info.sentiment_score.unwrap_or(0.0),
    };
}

fn apply_summary(result: &mut TranscriptionResult, summary: &SummaryInfo) {
    if let Some(text) = summary.short.as_ref().or(summary.text.as_ref()) {
        result.summary = text.clone();
    }
}

fn normalize_channels(payload: &ChannelsPayload) -> TranscriptionResult {
    let mut result = TranscriptionResult::default();

    let alternative = payload
        .channels
        .first()
        .and_then(|c| c.alternatives.first());

    if let Some(alt) = alternative {
        if let Some(transcript) = alt.transcript.as_deref() {
            if !transcript.is_empty() {
                result.text = transcript.to_string();
            }
        }
        result.words = convert_words(&alt.words);
    }

    // channel alternative came up empty, fall back to utterances
    if result.text == TranscriptionResult::default().text {
        fill_from_utterances(&mut result, &payload.utterances);
    }

    if let Some(sentiment) = alternative.and_then(|a| a.sentiment.as_ref()) {
        apply_sentiment(&mut result, sentiment);
    } else if let Some(average) = payload.sentiments.as_ref().and_then(|s| s.average.as_ref()) {
        apply_sentiment(&mut result, average);
    }

    if let Some(summary) = payload.summary.as_ref() {
        apply_summary(&mut result, summary);
    }

    result
}

fn normalize_utterances(payload: &UtterancesPayload) -> TranscriptionResult {
    let mut result = TranscriptionResult::default();

    fill_from_utterances(&mut result, &payload.utterances);

    if let Some(average) = payload.sentiments.as_ref().and_then(|s| s.average.as_ref()) {
        apply_sentiment(&mut result, average);
    }

    if let Some(summary) = payload.summary.as_ref() {
        apply_summary(&mut result, summary);
    }

    result
}

fn normalize_raw(value: &serde_json::Value) -> TranscriptionResult {
    // the raw document nests everything under "results"
    let results = value.get("results").unwrap_or(value);

    match serde_json::from_value::<ChannelsPayload>(results.clone()) {
        Ok(payload) => normalize_channels(&payload),
        Err(e) => {
            tracing::warn!(error = %e, "unparseable raw transcription payload");
            TranscriptionResult::from_fault(format!("malformed provider payload: {}", e))
        }
    }
}

/// Normalize a provider response into the canonical shape. Total function:
/// every input produces a value.
pub fn normalize(response: &ProviderResponse) -> TranscriptionResult {
    match response {
        ProviderResponse::Channels(payload) => normalize_channels(payload),
        ProviderResponse::Utterances(payload) => normalize_utterances(payload),
        ProviderResponse::Raw(value) => normalize_raw(value),
    }
}

/// Run a provider and normalize, converting any fault into the default shape
/// with `error` set.
pub async fn transcribe_to_canonical(
    provider: &dyn TranscriptionProvider,
    audio: &[u8],
    content_type: &str,
) -> TranscriptionResult {
    match provider.transcribe(audio, content_type).await {
        Ok(response) => normalize(&response),
        Err(fault) => {
            tracing::warn!(error = %fault, "transcription fault, using default shape");
            TranscriptionResult::from_fault(fault.to_string())
        }
    }
}
