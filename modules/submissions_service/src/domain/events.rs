//! Submission lifecycle notifications
//!
//! Notifications drive outbound emails and other integrations. Delivery is
//! best-effort: a failing notifier is logged and never fails the operation.

use crate::contract::{FormId, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle events a notification can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionEvent {
    /// A submission was received or finalized
    OnSubmission,
    /// A submission was deleted
    OnDelete,
    /// A submission was edited
    OnEdit,
}

impl SubmissionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnSubmission => "on_submission",
            Self::OnDelete => "on_delete",
            Self::OnEdit => "on_edit",
        }
    }
}

/// Event data handed to the notifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionNotification {
    pub event: SubmissionEvent,
    pub form_id: FormId,
    pub submission_id: SubmissionId,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
}

impl SubmissionNotification {
    pub fn new(event: SubmissionEvent, form_id: FormId, submission_id: SubmissionId) -> Self {
        Self {
            event,
            form_id,
            submission_id,
            timestamp: Utc::now(),
        }
    }
}

/// Notifier trait for dispatching submission events
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: SubmissionNotification) -> anyhow::Result<()>;
}

/// No-op notifier for testing or when notifications are disabled
pub struct NoOpNotifier;

#[async_trait::async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, _notification: SubmissionNotification) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_creation() {
        let notification = SubmissionNotification::new(SubmissionEvent::OnEdit, 3, 42);

        assert_eq!(notification.event, SubmissionEvent::OnEdit);
        assert_eq!(notification.form_id, 3);
        assert_eq!(notification.submission_id, 42);
    }

    #[test]
    fn test_event_names_match_serialized_form() {
        for event in [
            SubmissionEvent::OnSubmission,
            SubmissionEvent::OnDelete,
            SubmissionEvent::OnEdit,
        ] {
            let serialized = serde_json::to_value(event).unwrap();
            assert_eq!(serialized, serde_json::Value::String(event.as_str().to_string()));
        }
    }

    #[tokio::test]
    async fn test_noop_notifier() {
        let result = NoOpNotifier
            .notify(SubmissionNotification::new(SubmissionEvent::OnDelete, 1, 1))
            .await;
        assert!(result.is_ok());
    }
}
