//! Usage event logging
//!
//! Writes usage events in JSONL format for consumption by analytics.
//! Disabled when no log path is configured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;
use uuid::Uuid;

/// Usage event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Login or token refresh attempt
    AuthAttempt,
    /// New account created
    Registered,
    /// User enrolled in a course, roadmap or career path
    Enrolled,
    /// Enrollment cancelled
    EnrollmentCancelled,
    /// Admin catalog mutation
    AdminMutation,
    /// Chat stream served
    ChatStream,
}

/// Usage event for billing/analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Event type
    pub event_type: EventType,
    /// Node that handled the request
    pub node_id: Uuid,
    /// User id (if authenticated)
    pub user_id: Option<Uuid>,
    /// Operation name or target (for example "courses.create")
    pub operation: Option<String>,
    /// Whether the operation succeeded
    pub success: bool,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl UsageEvent {
    pub fn new(event_type: EventType, node_id: Uuid) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            node_id,
            user_id: None,
            operation: None,
            success: true,
            metadata: None,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }
}

/// JSONL usage event writer
#[derive(Clone)]
pub struct UsageLogger {
    writer: Option<Arc<Mutex<BufWriter<std::fs::File>>>>,
}

impl UsageLogger {
    /// Create a logger appending to the given path, or a disabled one
    pub fn new(path: Option<&str>) -> Self {
        let writer = path.and_then(|p| {
            let path = PathBuf::from(p);
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Some(Arc::new(Mutex::new(BufWriter::new(file)))),
                Err(e) => {
                    error!("Failed to open usage log {}: {}", path.display(), e);
                    None
                }
            }
        });
        Self { writer }
    }

    /// Disabled logger, used in tests and when no path is configured
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Append one event; failures are logged and swallowed so usage
    /// accounting never breaks request handling
    pub async fn log(&self, event: UsageEvent) {
        let Some(ref writer) = self.writer else {
            return;
        };
        let line = match serde_json::to_string(&event) {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to serialize usage event: {}", e);
                return;
            }
        };
        let mut writer = writer.lock().await;
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            error!("Failed to write usage event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_logger_is_silent() {
        let logger = UsageLogger::disabled();
        assert!(!logger.is_enabled());
        logger
            .log(UsageEvent::new(EventType::AuthAttempt, Uuid::new_v4()))
            .await;
    }

    #[tokio::test]
    async fn test_writes_jsonl() {
        let path = std::env::temp_dir().join(format!("lyceum-usage-{}.jsonl", Uuid::new_v4()));
        let logger = UsageLogger::new(path.to_str());
        assert!(logger.is_enabled());

        let node = Uuid::new_v4();
        let user = Uuid::new_v4();
        logger
            .log(
                UsageEvent::new(EventType::Enrolled, node)
                    .with_user(user)
                    .with_operation("courses.enroll"),
            )
            .await;
        logger
            .log(UsageEvent::new(EventType::AuthAttempt, node).failed())
            .await;

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: UsageEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.event_type, EventType::Enrolled);
        assert_eq!(first.user_id, Some(user));
        assert!(first.success);

        let second: UsageEvent = serde_json::from_str(lines[1]).unwrap();
        assert!(!second.success);

        let _ = std::fs::remove_file(&path);
    }
}
