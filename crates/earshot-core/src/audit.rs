//! Security audit logging
//!
//! Structured audit logging for security-relevant events:
//! - Authentication attempts (success/failure)
//! - Rate limit violations
//! - Rejected uploads and other suspicious activity
//!
//! Events are emitted with the `audit` target so they can be filtered or
//! shipped separately from application logs.

use serde::Serialize;

/// Severity assigned to a security event, used for log level selection.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// Classify an event name into a severity bucket.
pub fn event_severity(event_type: &str) -> Severity {
    match event_type {
        "subscription_bypass_attempt" | "invalid_token_repeated" | "file_upload_attack" => {
            Severity::Critical
        }
        "invalid_file_rejected" | "subscription_check_error" | "file_processing_error" => {
            Severity::High
        }
        _ => Severity::Medium,
    }
}

#[derive(Debug, Serialize)]
pub struct AuditLogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_type: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditLogEntry {
    pub fn new(event_type: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            severity: event_severity(event_type),
            event_type: event_type.to_string(),
            subject_id: None,
            client_ip: None,
            request_path: None,
            details: None,
            success: true,
            error_message: None,
        }
    }

    pub fn with_subject_id(mut self, subject_id: Option<String>) -> Self {
        self.subject_id = subject_id;
        self
    }

    pub fn with_client_ip(mut self, client_ip: Option<String>) -> Self {
        self.client_ip = client_ip;
        self
    }

    pub fn with_request_path(mut self, path: String) -> Self {
        self.request_path = Some(path);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_failure(mut self, error_message: String) -> Self {
        self.success = false;
        self.error_message = Some(error_message);
        self
    }

    pub fn log(&self) {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());

        match self.severity {
            Severity::Critical => {
                tracing::event!(
                    target: "audit",
                    tracing::Level::ERROR,
                    audit_entry = %json,
                    event_type = %self.event_type,
                    success = self.success,
                    "Security audit log"
                );
            }
            Severity::High => {
                tracing::event!(
                    target: "audit",
                    tracing::Level::WARN,
                    audit_entry = %json,
                    event_type = %self.event_type,
                    success = self.success,
                    "Security audit log"
                );
            }
            Severity::Medium => {
                if self.success {
                    tracing::event!(
                        target: "audit",
                        tracing::Level::INFO,
                        audit_entry = %json,
                        event_type = %self.event_type,
                        success = self.success,
                        "Security audit log"
                    );
                } else {
                    tracing::event!(
                        target: "audit",
                        tracing::Level::WARN,
                        audit_entry = %json,
                        event_type = %self.event_type,
                        success = self.success,
                        error = ?self.error_message,
                        "Security audit log - failure"
                    );
                }
            }
        }
    }
}

/// Log an authentication attempt.
pub fn log_authentication_attempt(
    subject_id: Option<String>,
    client_ip: Option<String>,
    success: bool,
    error_message: Option<String>,
) {
    let mut entry = AuditLogEntry::new(if success {
        "authentication_success"
    } else {
        "authentication_failure"
    })
    .with_subject_id(subject_id)
    .with_client_ip(client_ip);

    if !success {
        entry = entry
            .with_failure(error_message.unwrap_or_else(|| "Authentication failed".to_string()));
    }

    entry.log();
}

/// Log a rate limit violation.
pub fn log_rate_limit_exceeded(client_ip: Option<String>, request_path: String, limit: u32) {
    AuditLogEntry::new("rate_limit_exceeded")
        .with_client_ip(client_ip)
        .with_request_path(request_path)
        .with_details(serde_json::json!({ "rate_limit": limit }))
        .with_failure("Rate limit exceeded".to_string())
        .log();
}

/// Log a generic security event with severity inferred from the event name.
pub fn log_security_event(event_type: &str, details: serde_json::Value) {
    AuditLogEntry::new(event_type)
        .with_details(details)
        .with_failure(format!("Security event: {}", event_type))
        .log();
}
