//! DecisionEvent emitter
//!
//! Events are queued on a bounded channel and delivered by a background
//! task, so resolution never waits on the sink. A full queue drops the
//! event and counts the failure. Without a sink URL events are only logged.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::metrics::StrategyMetrics;
use super::{Result, TelemetryError};
use crate::config::TelemetrySettings;
use crate::contracts::DecisionEvent;

pub struct DecisionEventEmitter {
    sender: Option<mpsc::Sender<DecisionEvent>>,
    metrics: Arc<StrategyMetrics>,
}

impl DecisionEventEmitter {
    /// Start the background delivery task; must be called inside a tokio runtime
    pub fn new(settings: &TelemetrySettings, metrics: Arc<StrategyMetrics>) -> Self {
        if !settings.emit_events {
            return Self::disabled(metrics);
        }

        let (sender, receiver) = mpsc::channel(settings.queue_size);
        let sink = settings
            .event_sink_url
            .clone()
            .map(|url| EventSink::new(url, Duration::from_millis(settings.timeout_ms)));

        tokio::spawn(Self::background_emitter(receiver, sink, Arc::clone(&metrics)));

        Self {
            sender: Some(sender),
            metrics,
        }
    }

    /// Emitter that discards every event
    pub fn disabled(metrics: Arc<StrategyMetrics>) -> Self {
        Self {
            sender: None,
            metrics,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue an event without waiting
    pub fn emit(&self, event: DecisionEvent) -> Result<()> {
        let Some(sender) = &self.sender else {
            return Ok(());
        };

        sender.try_send(event).map_err(|e| {
            self.metrics.record_event_failed();
            TelemetryError::EmissionFailed(format!("Failed to queue event: {}", e))
        })
    }

    async fn background_emitter(
        mut receiver: mpsc::Receiver<DecisionEvent>,
        sink: Option<EventSink>,
        metrics: Arc<StrategyMetrics>,
    ) {
        while let Some(event) = receiver.recv().await {
            match &sink {
                Some(sink) => match sink.send(&event).await {
                    Ok(()) => {
                        metrics.record_event_emitted();
                        debug!(
                            event_id = %event.event_id,
                            inputs_hash = %event.inputs_hash,
                            "Decision event delivered"
                        );
                    }
                    Err(e) => {
                        metrics.record_event_failed();
                        warn!(event_id = %event.event_id, error = %e, "Failed to deliver decision event");
                    }
                },
                None => {
                    metrics.record_event_emitted();
                    info!(
                        event_id = %event.event_id,
                        inputs_hash = %event.inputs_hash,
                        catalog_version = %event.catalog_version,
                        summary = %event.summary(),
                        "Decision event"
                    );
                }
            }
        }
    }
}

/// HTTP endpoint accepting decision events
struct EventSink {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl EventSink {
    fn new(url: String, timeout: Duration) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn send(&self, event: &DecisionEvent) -> Result<()> {
        let url = format!("{}/api/v1/events", self.url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(event)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TelemetryError::HttpError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TelemetryError::HttpError(format!(
                "event sink returned {}",
                response.status()
            )))
        }
    }
}
