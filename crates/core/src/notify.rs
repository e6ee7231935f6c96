use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::request::RequestId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SubmissionSucceeded,
    SubmissionFailed,
}

/// A user-visible toast-style message emitted by the submission lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: String,
    pub request_id: Option<RequestId>,
    pub correlation_id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        request_id: Option<RequestId>,
        correlation_id: impl Into<String>,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            notification_id: Uuid::new_v4().to_string(),
            request_id,
            correlation_id: correlation_id.into(),
            kind,
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[derive(Clone, Default)]
pub struct InMemoryNotificationSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotificationSink {
    pub fn notifications(&self) -> Vec<Notification> {
        match self.notifications.lock() {
            Ok(notifications) => notifications.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn notify(&self, notification: Notification) {
        match self.notifications.lock() {
            Ok(mut notifications) => notifications.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

/// Sink for headless hosts: renders notifications as structured log events
/// instead of UI toasts.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notification: Notification) {
        let request_id =
            notification.request_id.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown");
        match notification.kind {
            NotificationKind::SubmissionSucceeded => tracing::info!(
                event_name = "notify.submission_succeeded",
                correlation_id = %notification.correlation_id,
                request_id,
                "{}",
                notification.message
            ),
            NotificationKind::SubmissionFailed => tracing::warn!(
                event_name = "notify.submission_failed",
                correlation_id = %notification.correlation_id,
                request_id,
                "{}",
                notification.message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::request::RequestId;
    use crate::notify::{
        InMemoryNotificationSink, Notification, NotificationKind, NotificationSink,
    };

    #[test]
    fn in_memory_sink_records_notifications_with_correlation_fields() {
        let sink = InMemoryNotificationSink::default();
        sink.notify(Notification::new(
            Some(RequestId("QR-test".to_owned())),
            "corr-7",
            NotificationKind::SubmissionSucceeded,
            "Your quote request has been sent.",
        ));

        let notifications = sink.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].correlation_id, "corr-7");
        assert_eq!(notifications[0].kind, NotificationKind::SubmissionSucceeded);
        assert_eq!(notifications[0].request_id.as_ref().map(|id| id.0.as_str()), Some("QR-test"));
        assert!(!notifications[0].message.is_empty());
    }
}
