//! Earshot Analysis Library
//!
//! Upload validation, the audio analyzer capability, and transcription
//! (provider transports plus the canonical normalizer).

pub mod analyzer;
pub mod transcription;
pub mod validator;

pub use analyzer::{AnalysisError, AnalysisOutcome, AudioAnalyzer, HttpAudioAnalyzer};
pub use transcription::{
    transcribe_to_canonical, HttpTranscriptionProvider, ProviderResponse, TranscriptionFault,
    TranscriptionProvider,
};
pub use validator::{sanitize_filename, AudioValidator, ValidationError};
