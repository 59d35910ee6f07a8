//! Transcription: provider transports and the canonical normalizer.

pub mod normalizer;
pub mod provider;

pub use normalizer::{normalize, transcribe_to_canonical};
pub use provider::{
    Alternative, Channel, ChannelsPayload, HttpTranscriptionProvider, ProviderResponse,
    SentimentInfo, Sentiments, SummaryInfo, TranscriptionFault, TranscriptionProvider, Utterance,
    UtterancesPayload, WordEntry,
};
