//! Fire-and-forget analytics events.
//!
//! The core emits events (lesson opened, playback failed, course completed)
//! into an injected sink. Delivery is best-effort by design: `record` never
//! fails and never blocks playback. The production build forwards events as
//! structured log records; tests capture them on a channel.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::AnalyticsConfig;

/// A single analytics event.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyticsEvent {
    /// Event name, e.g. `lesson_opened`.
    pub name: String,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
    /// Stable device identifier, when known.
    pub device_id: Option<String>,
    /// Lesson the event relates to, when applicable.
    pub lesson_id: Option<String>,
    /// Free-form event attributes, e.g. failure classification.
    pub attributes: BTreeMap<String, String>,
}

impl AnalyticsEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            occurred_at: Utc::now(),
            device_id: None,
            lesson_id: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_lesson(mut self, lesson_id: impl Into<String>) -> Self {
        self.lesson_id = Some(lesson_id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Fire-and-forget event sink.
pub trait AnalyticsSink: Send + Sync {
    /// Submits an event. Must not block and must not fail; implementations
    /// swallow delivery problems.
    fn record(&self, event: AnalyticsEvent);
}

/// Forwards events to structured logging.
#[derive(Debug, Default)]
pub struct TracingAnalyticsSink;

impl TracingAnalyticsSink {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyticsSink for TracingAnalyticsSink {
    fn record(&self, event: AnalyticsEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_else(|_| event.name.clone());
        tracing::info!(target: "voltlearn::analytics", event = %event.name, %payload);
    }
}

/// Drops every event.
#[derive(Debug, Default)]
pub struct NullAnalyticsSink;

impl AnalyticsSink for NullAnalyticsSink {
    fn record(&self, _event: AnalyticsEvent) {}
}

/// Applies the configuration's master switch to a sink choice.
///
/// Returns `sink` unchanged when analytics are enabled, the null sink
/// otherwise. Event producers hold the result and stay unaware of the switch.
pub fn select_sink(config: &AnalyticsConfig, sink: Arc<dyn AnalyticsSink>) -> Arc<dyn AnalyticsSink> {
    if config.enabled {
        sink
    } else {
        Arc::new(NullAnalyticsSink)
    }
}

/// Captures events on an unbounded channel for test assertions.
pub struct ChannelAnalyticsSink {
    tx: tokio::sync::mpsc::UnboundedSender<AnalyticsEvent>,
}

impl ChannelAnalyticsSink {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<AnalyticsEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AnalyticsSink for ChannelAnalyticsSink {
    fn record(&self, event: AnalyticsEvent) {
        // Receiver gone means nobody is asserting; fire-and-forget.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = AnalyticsEvent::new("lesson_opened")
            .with_device("dev-1")
            .with_lesson("1-1")
            .with_attribute("source", "catalog");

        assert_eq!(event.name, "lesson_opened");
        assert_eq!(event.device_id.as_deref(), Some("dev-1"));
        assert_eq!(event.lesson_id.as_deref(), Some("1-1"));
        assert_eq!(event.attributes.get("source").map(String::as_str), Some("catalog"));
    }

    #[test]
    fn test_event_serializes() {
        let event = AnalyticsEvent::new("playback_failed")
            .with_lesson("5-2")
            .with_attribute("reason", "not_playable");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["name"], "playback_failed");
        assert_eq!(json["lesson_id"], "5-2");
        assert_eq!(json["attributes"]["reason"], "not_playable");
    }

    #[tokio::test]
    async fn test_select_sink_honors_master_switch() {
        let (sink, mut rx) = ChannelAnalyticsSink::new();
        let disabled = select_sink(&AnalyticsConfig { enabled: false }, Arc::new(sink));
        disabled.record(AnalyticsEvent::new("lesson_opened"));
        assert!(rx.try_recv().is_err(), "disabled analytics must drop events");

        let (sink, mut rx) = ChannelAnalyticsSink::new();
        let enabled = select_sink(&AnalyticsConfig { enabled: true }, Arc::new(sink));
        enabled.record(AnalyticsEvent::new("lesson_opened"));
        assert_eq!(rx.try_recv().unwrap().name, "lesson_opened");
    }

    #[tokio::test]
    async fn test_channel_sink_captures_events() {
        let (sink, mut rx) = ChannelAnalyticsSink::new();

        sink.record(AnalyticsEvent::new("lesson_opened").with_lesson("2-3"));
        sink.record(AnalyticsEvent::new("lesson_completed").with_lesson("2-3"));

        assert_eq!(rx.recv().await.unwrap().name, "lesson_opened");
        assert_eq!(rx.recv().await.unwrap().name, "lesson_completed");
    }

    #[test]
    fn test_channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelAnalyticsSink::new();
        drop(rx);
        // Must not panic.
        sink.record(AnalyticsEvent::new("lesson_opened"));
    }
}
