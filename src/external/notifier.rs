//! The notifier collaborator (spec §4.6 step 6, §6): dispatches a
//! rendered alert to a single destination (e.g. webhook, email, chat
//! channel). Never implemented for real inside this crate — destinations
//! are an external concern, same as the PQL executor.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::model::alert::Alert;

/// A rendered notification ready for dispatch: the destination id from
/// the firing trigger's action plus the rendered subject/message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub destination_id: String,
    pub subject: String,
    pub message: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &Alert, notification: &RenderedNotification) -> Result<()>;
}

/// Test/demo double that records every notification it was asked to send
/// instead of dispatching it anywhere, and logs it at `info` — mirrors the
/// hub's `discord::post_webhook` call site logging without the network
/// hop.
#[derive(Default)]
pub struct LoggingNotifier {
    sent: Mutex<Vec<(String, RenderedNotification)>>,
}

impl LoggingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(String, RenderedNotification)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, alert: &Alert, notification: &RenderedNotification) -> Result<()> {
        tracing::info!(
            destination_id = %notification.destination_id,
            monitor_id = %alert.monitor_id,
            trigger_id = %alert.trigger_id,
            subject = %notification.subject,
            "dispatching alert notification"
        );
        let alert_id = alert
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<unmaterialized>".to_string());
        self.sent.lock().await.push((alert_id, notification.clone()));
        Ok(())
    }
}
