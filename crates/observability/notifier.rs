use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

const QUEUE_CAPACITY: usize = 256;

#[derive(Clone, Debug, Serialize)]
pub(crate) struct SpanSummary {
    pub(crate) name: String,
    pub(crate) fields: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct AlertEvent {
    pub(crate) level: String,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
    pub(crate) target: String,
    pub(crate) location: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) spans: Vec<SpanSummary>,
}

#[async_trait]
pub(crate) trait AlertSink: Send + Sync {
    async fn deliver(&self, event: &AlertEvent) -> Result<()>;
    fn sink_name(&self) -> &'static str;
}

/// Bounded hand-off between the tracing layer and the sinks. Never blocks the caller.
#[derive(Clone)]
pub(crate) struct AlertDispatcher {
    tx: mpsc::Sender<AlertEvent>,
}

impl AlertDispatcher {
    pub(crate) fn spawn(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertEvent>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for sink in &sinks {
                    if let Err(error) = sink.deliver(&event).await {
                        // Delivery failures stay below the alert threshold to avoid feedback loops.
                        warn!(
                            sink = sink.sink_name(),
                            error = %error,
                            "observability: alert delivery failed"
                        );
                    }
                }
            }
        });

        Self { tx }
    }

    pub(crate) fn dispatch(&self, event: AlertEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("observability: alert queue full; dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("observability: alert queue closed; dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingSink {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn deliver(&self, event: &AlertEvent) -> Result<()> {
            self.seen
                .lock()
                .unwrap()
                .push(event.message.clone().unwrap_or_default());
            Ok(())
        }

        fn sink_name(&self) -> &'static str {
            "recording"
        }
    }

    fn sample_event(message: &str) -> AlertEvent {
        AlertEvent {
            level: "ERROR".to_string(),
            timestamp: Utc::now(),
            service_name: "gym".to_string(),
            environment: "test".to_string(),
            component: "backend".to_string(),
            target: "backend::usecases".to_string(),
            location: None,
            message: Some(message.to_string()),
            fields: BTreeMap::new(),
            spans: Vec::new(),
        }
    }

    #[tokio::test]
    async fn dispatched_events_reach_every_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = AlertDispatcher::spawn(vec![Arc::new(RecordingSink {
            seen: Arc::clone(&seen),
        })]);

        dispatcher.dispatch(sample_event("billing: webhook rejected"));

        for _ in 0..50 {
            if !seen.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &["billing: webhook rejected".to_string()]
        );
    }
}
