//! Report processing pipeline: download, transcribe, analyze, record.

use std::sync::Arc;

use earshot_analysis::analyzer::AudioAnalyzer;
use earshot_analysis::transcription::{transcribe_to_canonical, TranscriptionProvider};
use earshot_core::audit;
use earshot_core::models::{ResultItem, TranscriptionResult};
use earshot_storage::ObjectStore;

use crate::jobs::JobStore;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to download object {key}: {source}")]
    Download {
        key: String,
        #[source]
        source: earshot_storage::StorageError,
    },

    #[error("Audio analysis failed: {0}")]
    Analysis(#[from] earshot_analysis::AnalysisError),

    #[error("Scratch file error: {0}")]
    Scratch(#[from] std::io::Error),
}

fn content_type_for(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".wav") {
        "audio/wav"
    } else if lower.ends_with(".m4a") {
        "audio/mp4"
    } else {
        "audio/mpeg"
    }
}

/// Runs the analysis pipeline for one dispatched report and records the
/// outcome in the job store.
pub struct ReportProcessor {
    storage: Arc<dyn ObjectStore>,
    analyzer: Arc<dyn AudioAnalyzer>,
    transcriber: Option<Arc<dyn TranscriptionProvider>>,
    jobs: JobStore,
}

impl ReportProcessor {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        analyzer: Arc<dyn AudioAnalyzer>,
        transcriber: Option<Arc<dyn TranscriptionProvider>>,
        jobs: JobStore,
    ) -> Self {
        Self {
            storage,
            analyzer,
            transcriber,
            jobs,
        }
    }

    /// Process one report. Transcription failure is non-fatal; analysis
    /// failure writes an error record and propagates. The scratch copy is
    /// removed on every exit path by the temp file's drop guard.
    #[tracing::instrument(skip(self), fields(task_id = %task_id, file_name = %file_name))]
    pub async fn process(
        &self,
        task_id: &str,
        _bucket_name: &str,
        file_name: &str,
    ) -> Result<(), ProcessError> {
        match self.run_pipeline(task_id, file_name).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.jobs.fail(task_id, e.to_string()).await;
                audit::log_security_event(
                    "file_processing_error",
                    serde_json::json!({
                        "task_id": task_id,
                        "file_name": file_name,
                        "error": e.to_string(),
                    }),
                );
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, task_id: &str, file_name: &str) -> Result<(), ProcessError> {
        let data = self
            .storage
            .get(file_name)
            .await
            .map_err(|source| ProcessError::Download {
                key: file_name.to_string(),
                source,
            })?;

        // scratch copy lives for the duration of the pipeline; NamedTempFile
        // unlinks it on drop, including early returns
        let scratch = tempfile::NamedTempFile::new()?;
        tokio::fs::write(scratch.path(), &data).await?;

        let transcription = self.transcribe(&data, file_name).await;

        let audio = tokio::fs::read(scratch.path()).await?;
        let outcome = self.analyzer.analyze(&audio, file_name).await?;

        let mut result: Vec<ResultItem> = Vec::with_capacity(outcome.confidences.len() + 1);
        result.push(ResultItem::Summary {
            summary_statistics: outcome.summary_statistics(),
        });
        result.extend(outcome.timeline_entries().into_iter().map(ResultItem::Timeline));

        self.jobs
            .complete(
                task_id,
                result,
                outcome.overall_prediction.clone(),
                outcome.aggregate_confidence,
                transcription,
            )
            .await;

        audit::AuditLogEntry::new("report_completed")
            .with_details(serde_json::json!({
                "task_id": task_id,
                "file_name": file_name,
                "total_chunks": outcome.total_chunks,
            }))
            .log();

        tracing::info!(task_id = %task_id, chunks = outcome.total_chunks, "report completed");
        Ok(())
    }

    async fn transcribe(&self, data: &[u8], file_name: &str) -> TranscriptionResult {
        match &self.transcriber {
            Some(provider) => {
                let result =
                    transcribe_to_canonical(provider.as_ref(), data, content_type_for(file_name))
                        .await;
                if let Some(error) = &result.error {
                    tracing::warn!(error = %error, "transcription failed, continuing with defaults");
                }
                result
            }
            None => TranscriptionResult::default(),
        }
    }
}
