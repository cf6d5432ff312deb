use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::{PoseGuardError, Result};
use crate::models::AlertEvent;

/// Delivers alerts to the user (notification center, terminal, ...)
pub trait AlertSink: Send + Sync {
    fn deliver(&self, alert: &AlertEvent) -> Result<()>;
}

/// Writes alerts to the log
#[derive(Debug, Default, Clone)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn deliver(&self, alert: &AlertEvent) -> Result<()> {
        info!(
            kind = ?alert.kind,
            title = %alert.title,
            fired_at = %alert.fired_at,
            "{}",
            alert.message
        );
        Ok(())
    }
}

/// Forwards alerts into a channel
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    tx: mpsc::UnboundedSender<AlertEvent>,
}

impl ChannelAlertSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlertEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelAlertSink { tx }, rx)
    }
}

impl AlertSink for ChannelAlertSink {
    fn deliver(&self, alert: &AlertEvent) -> Result<()> {
        self.tx
            .send(alert.clone())
            .map_err(|_| PoseGuardError::Internal("alert receiver closed".to_string()))
    }
}

struct QueuedAlert {
    due: Instant,
    alert: AlertEvent,
}

/// Fire-and-forget alert delivery
///
/// `dispatch` never blocks: alerts are queued to a single worker task that
/// waits out the lead delay and hands them to the sink in emission order.
#[derive(Clone)]
pub struct AlertDispatcher {
    tx: mpsc::UnboundedSender<QueuedAlert>,
    lead: Duration,
}

impl AlertDispatcher {
    /// Start the delivery worker; it runs until every dispatcher clone is dropped
    pub fn spawn(sink: Arc<dyn AlertSink>, lead: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedAlert>();

        tokio::spawn(async move {
            while let Some(queued) = rx.recv().await {
                tokio::time::sleep_until(queued.due).await;
                if let Err(err) = sink.deliver(&queued.alert) {
                    warn!(error = %err, kind = ?queued.alert.kind, "alert delivery failed");
                }
            }
        });

        AlertDispatcher { tx, lead }
    }

    pub fn dispatch(&self, alert: AlertEvent) {
        let queued = QueuedAlert {
            due: Instant::now() + self.lead,
            alert,
        };
        if self.tx.send(queued).is_err() {
            warn!("alert dropped, delivery worker has stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertKind;
    use chrono::Utc;

    fn alert(message: &str) -> AlertEvent {
        AlertEvent::new(AlertKind::BadPosture, "PoseGuard", message, Utc::now())
    }

    #[tokio::test]
    async fn test_dispatch_preserves_order() {
        let (sink, mut rx) = ChannelAlertSink::new();
        let dispatcher = AlertDispatcher::spawn(Arc::new(sink), Duration::ZERO);

        dispatcher.dispatch(alert("first"));
        dispatcher.dispatch(alert("second"));

        assert_eq!(rx.recv().await.unwrap().message, "first");
        assert_eq!(rx.recv().await.unwrap().message, "second");
    }

    #[tokio::test]
    async fn test_dispatch_waits_for_lead() {
        let (sink, mut rx) = ChannelAlertSink::new();
        let dispatcher = AlertDispatcher::spawn(Arc::new(sink), Duration::from_millis(200));

        let started = std::time::Instant::now();
        dispatcher.dispatch(alert("late"));
        assert!(rx.try_recv().is_err());

        let delivered = rx.recv().await.unwrap();
        assert_eq!(delivered.message, "late");
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn test_channel_sink_reports_closed_receiver() {
        let (sink, rx) = ChannelAlertSink::new();
        drop(rx);
        assert!(sink.deliver(&alert("nobody")).is_err());
    }
}
