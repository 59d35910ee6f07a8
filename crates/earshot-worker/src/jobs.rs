//! In-memory job store shared by the API and the worker.
//!
//! Sharded to reduce lock contention; every read-modify-write sequence
//! (chat check-then-increment, multi-field completion) runs under the shard
//! lock for its key, so per-key updates are atomic.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;

use earshot_core::constants::CHAT_MESSAGE_LIMIT;
use earshot_core::models::{ChatUsage, Job, JobStatus, ResultItem, TranscriptionResult};

const DEFAULT_SHARD_COUNT: usize = 16;

#[derive(Clone)]
pub struct JobStore {
    shards: Vec<Arc<Mutex<HashMap<String, Job>>>>,
    shard_count: usize,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARD_COUNT)
    }

    pub fn with_shards(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            shard_count,
        }
    }

    fn shard_for(&self, task_id: &str) -> &Arc<Mutex<HashMap<String, Job>>> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        task_id.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shard_count]
    }

    /// Insert a fresh pending record if none exists. Never overwrites: a worker
    /// that finished before the dispatcher wrote its record must not be reset.
    pub async fn init_pending(&self, task_id: &str) {
        let mut shard = self.shard_for(task_id).lock().await;
        shard
            .entry(task_id.to_string())
            .or_insert_with(Job::pending);
    }

    pub async fn get(&self, task_id: &str) -> Option<Job> {
        let shard = self.shard_for(task_id).lock().await;
        shard.get(task_id).cloned()
    }

    /// Write a completed job record, preserving any chat count already
    /// accumulated against this task id.
    pub async fn complete(
        &self,
        task_id: &str,
        result: Vec<ResultItem>,
        overall_prediction: String,
        aggregate_confidence: f64,
        transcription: TranscriptionResult,
    ) {
        let mut shard = self.shard_for(task_id).lock().await;
        let chat_message_count = shard
            .get(task_id)
            .map(|j| j.chat_message_count)
            .unwrap_or(0);
        shard.insert(
            task_id.to_string(),
            Job {
                status: JobStatus::Completed,
                result: Some(result),
                overall_prediction: Some(overall_prediction),
                aggregate_confidence: Some(aggregate_confidence),
                transcription_data: Some(transcription),
                chat_message_count,
                error: None,
            },
        );
    }

    /// Write a failed job record, preserving the accumulated chat count.
    pub async fn fail(&self, task_id: &str, error: String) {
        let mut shard = self.shard_for(task_id).lock().await;
        let chat_message_count = shard
            .get(task_id)
            .map(|j| j.chat_message_count)
            .unwrap_or(0);
        shard.insert(
            task_id.to_string(),
            Job {
                status: JobStatus::Error,
                result: None,
                overall_prediction: None,
                aggregate_confidence: None,
                transcription_data: None,
                chat_message_count,
                error: Some(error),
            },
        );
    }

    /// Atomic chat quota check-then-increment. At the cap the call is rejected
    /// without mutation, so retries after a block never consume quota.
    pub async fn check_and_increment_chat(&self, task_id: &str) -> (bool, u32) {
        let mut shard = self.shard_for(task_id).lock().await;
        let job = shard
            .entry(task_id.to_string())
            .or_insert_with(Job::pending);

        if job.chat_message_count >= CHAT_MESSAGE_LIMIT {
            return (false, 0);
        }

        job.chat_message_count += 1;
        (true, CHAT_MESSAGE_LIMIT - job.chat_message_count)
    }

    /// Quota usage for a task id; unknown ids read as zero without insertion.
    pub async fn chat_usage(&self, task_id: &str) -> ChatUsage {
        let shard = self.shard_for(task_id).lock().await;
        let count = shard
            .get(task_id)
            .map(|j| j.chat_message_count)
            .unwrap_or(0);
        ChatUsage::from_count(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_pending_does_not_overwrite() {
        let store = JobStore::new();
        store
            .complete(
                "t1",
                vec![],
                "human".to_string(),
                0.9,
                TranscriptionResult::default(),
            )
            .await;
        store.init_pending("t1").await;

        let job = store.get("t1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn complete_preserves_chat_count() {
        let store = JobStore::new();
        store.init_pending("t1").await;
        let (allowed, _) = store.check_and_increment_chat("t1").await;
        assert!(allowed);

        store
            .complete(
                "t1",
                vec![],
                "AI".to_string(),
                0.8,
                TranscriptionResult::default(),
            )
            .await;
        let job = store.get("t1").await.unwrap();
        assert_eq!(job.chat_message_count, 1);
    }

    #[tokio::test]
    async fn quota_sequence_allows_ten_then_blocks() {
        let store = JobStore::new();
        let mut last_remaining = CHAT_MESSAGE_LIMIT;

        for i in 0..10 {
            let (allowed, remaining) = store.check_and_increment_chat("t1").await;
            assert!(allowed, "call {} should be allowed", i + 1);
            assert!(remaining < last_remaining);
            last_remaining = remaining;
        }
        assert_eq!(last_remaining, 0);

        let (allowed, remaining) = store.check_and_increment_chat("t1").await;
        assert!(!allowed);
        assert_eq!(remaining, 0);

        // rejection at the cap does not mutate the stored count
        let usage = store.chat_usage("t1").await;
        assert_eq!(usage.message_count, 10);
    }

    #[tokio::test]
    async fn unknown_task_usage_defaults_to_zero() {
        let store = JobStore::new();
        let usage = store.chat_usage("never-seen").await;
        assert_eq!(usage.message_count, 0);
        assert_eq!(usage.limit, 10);
        assert_eq!(usage.remaining, 10);

        // the read did not create a record
        assert!(store.get("never-seen").await.is_none());
    }

    #[tokio::test]
    async fn fail_writes_error_record() {
        let store = JobStore::new();
        store.init_pending("t1").await;
        store.fail("t1", "analysis blew up".to_string()).await;

        let job = store.get("t1").await.unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.as_deref(), Some("analysis blew up"));
        assert!(job.result.is_none());
    }
}
