//! Notification delivery (fire-and-forget).

use std::sync::{Arc, Mutex};

use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use adhelm_events::Severity;

/// Outbound alert sink.
///
/// Fire-and-forget: implementations swallow and log their own delivery
/// failures; a broken channel must never abort the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, severity: Severity, message: &str, metadata: JsonValue);
}

impl<S> NotificationSink for Arc<S>
where
    S: NotificationSink + ?Sized,
{
    fn notify(&self, severity: Severity, message: &str, metadata: JsonValue) {
        (**self).notify(severity, message, metadata)
    }
}

/// Sink that forwards notifications to the process log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, severity: Severity, message: &str, metadata: JsonValue) {
        match severity {
            Severity::Info => info!(%metadata, "{message}"),
            Severity::Warning => warn!(%metadata, "{message}"),
            Severity::Critical => error!(%metadata, "{message}"),
        }
    }
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryNotificationSink {
    inner: Mutex<Vec<(Severity, String, JsonValue)>>,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<(Severity, String, JsonValue)> {
        self.inner.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn notify(&self, severity: Severity, message: &str, metadata: JsonValue) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.push((severity, message.to_string(), metadata));
        }
    }
}
