pub mod analyze;
pub mod auth_token;
pub mod chat;
pub mod health;
pub mod process_report;
pub mod report;
pub mod report_status;
pub mod storage_put;
pub mod transcribe;
pub mod upload_url;

use serde::Deserialize;

/// Query flag carried by tier-sensitive endpoints.
#[derive(Debug, Deserialize)]
pub struct TierQuery {
    #[serde(default)]
    pub has_subscription: bool,
}
