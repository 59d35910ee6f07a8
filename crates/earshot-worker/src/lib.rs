//! Earshot Worker Library
//!
//! Job state, task queue dispatch, and the report processing pipeline.

pub mod jobs;
pub mod processor;
pub mod queue;

pub use jobs::JobStore;
pub use processor::ReportProcessor;
pub use queue::{HttpTaskQueue, QueueError, TaskQueue};
