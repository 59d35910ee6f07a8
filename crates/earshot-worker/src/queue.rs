//! Task queue: dispatch of analysis jobs to the worker trigger.
//!
//! Dispatch is decoupled from delivery: `dispatch` assigns the task id and
//! returns immediately, the POST to the worker runs in a spawned task with
//! the delivery deadline on the HTTP client.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use uuid::Uuid;

use earshot_core::constants::{
    DISPATCH_DEADLINE_SECS, PROCESS_REPORT_PATH, QUEUE_NAME_HEADER, QUEUE_SIGNATURE_HEADER,
    TASK_NAME_HEADER,
};
use earshot_core::models::ProcessReportRequest;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Failed to serialize task payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queue dispatch failed: {0}")]
    Dispatch(String),
}

/// Capability for enqueueing analysis tasks. Returns the assigned task id.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn dispatch(&self, payload: ProcessReportRequest) -> Result<String, QueueError>;
}

/// Queue that delivers tasks by POSTing to the worker trigger path with
/// queue-origin headers and, when a shared secret is configured, an HMAC
/// signature over the body.
pub struct HttpTaskQueue {
    client: reqwest::Client,
    worker_base_url: String,
    queue_name: String,
    shared_secret: Option<Vec<u8>>,
}

impl HttpTaskQueue {
    pub fn new(
        worker_base_url: String,
        queue_name: String,
        shared_secret: Option<Vec<u8>>,
    ) -> Result<Self, QueueError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DISPATCH_DEADLINE_SECS))
            .build()
            .map_err(|e| QueueError::Dispatch(e.to_string()))?;

        Ok(Self {
            client,
            worker_base_url,
            queue_name,
            shared_secret,
        })
    }

    pub fn sign_body(secret: &[u8], body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key size");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl TaskQueue for HttpTaskQueue {
    #[tracing::instrument(skip(self), fields(file_name = %payload.file_name))]
    async fn dispatch(&self, payload: ProcessReportRequest) -> Result<String, QueueError> {
        let task_id = Uuid::new_v4().to_string();
        let body = serde_json::to_vec(&payload)?;

        let url = format!(
            "{}{}",
            self.worker_base_url.trim_end_matches('/'),
            PROCESS_REPORT_PATH
        );

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header(TASK_NAME_HEADER, &task_id)
            .header(QUEUE_NAME_HEADER, &self.queue_name);

        if let Some(secret) = &self.shared_secret {
            request = request.header(QUEUE_SIGNATURE_HEADER, Self::sign_body(secret, &body));
        }

        let request = request.body(body);
        let dispatched_task = task_id.clone();

        // delivery runs off the request path; failures surface in the job
        // record staying pending and in the log
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::error!(
                        task_id = %dispatched_task,
                        status = %response.status(),
                        "worker trigger rejected task delivery"
                    );
                }
                Ok(_) => {
                    tracing::debug!(task_id = %dispatched_task, "task delivered");
                }
                Err(e) => {
                    tracing::error!(task_id = %dispatched_task, error = %e, "task delivery failed");
                }
            }
        });

        Ok(task_id)
    }
}
