//! Tier-based result projection.
//!
//! Subscribers see the full job record. Free-tier callers get the summary
//! statistics and the full timeline but no transcription, and the response is
//! flagged as limited.

use earshot_core::models::{Job, JobStatus, JobView, Tier};

pub fn project(job: Job, tier: Tier) -> JobView {
    match tier {
        Tier::Subscriber => JobView::from(job),
        Tier::Free => {
            if job.status != JobStatus::Completed {
                return JobView::from(job);
            }
            let mut view = JobView::from(job);
            view.transcription_data = None;
            view.is_limited = Some(true);
            view
        }
    }
}
