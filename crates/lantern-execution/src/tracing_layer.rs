//! Tracing layer that forwards generation events to the UI.
//!
//! The orchestrator logs turn transitions with structured fields
//! (`session_id`, `message_id`, `tokens`, `code`, ...). This layer picks up
//! those events and sends them over a tokio channel so a frontend can show
//! progress without parsing log lines.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Target prefix of the events this layer forwards.
pub const GENERATION_TARGET: &str = "lantern_application::generation";

/// Event data sent to the frontend
#[derive(Debug, Clone, serde::Serialize)]
pub struct GenerationEvent {
    /// Event target (e.g., "lantern_application::generation::orchestrator")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    pub message: String,
    /// Structured fields from the event, `message` excluded
    pub fields: HashMap<String, Value>,
    pub timestamp: String,
}

pub struct GenerationEventLayer {
    sender: mpsc::UnboundedSender<GenerationEvent>,
    target_prefix: &'static str,
}

impl GenerationEventLayer {
    pub fn new(sender: mpsc::UnboundedSender<GenerationEvent>) -> Self {
        Self {
            sender,
            target_prefix: GENERATION_TARGET,
        }
    }

    /// Creates a layer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GenerationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Forwards events under `prefix` instead of the orchestrator's target.
    pub fn with_target_prefix(mut self, prefix: &'static str) -> Self {
        self.target_prefix = prefix;
        self
    }
}

impl<S> Layer<S> for GenerationEventLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(self.target_prefix) {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        let message = match fields.remove("message") {
            Some(Value::String(message)) => message,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let generation_event = GenerationEvent {
            target: metadata.target().to_string(),
            level: metadata.level().to_string(),
            message,
            fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // Receiver gone means nobody is listening.
        let _ = self.sender.send(generation_event);
    }
}

/// Field visitor that extracts tracing event fields into a HashMap
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(
            field.name().to_string(),
            serde_json::json!(format!("{:?}", value)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_forwards_generation_events_with_fields() {
        let (layer, mut rx) = GenerationEventLayer::channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(
                target: "lantern_application::generation::orchestrator",
                message_id = "m-1",
                tokens = 3u64,
                "[Orchestrator] Generation completed"
            );
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.level, "INFO");
        assert_eq!(event.message, "[Orchestrator] Generation completed");
        assert_eq!(event.fields.get("message_id"), Some(&serde_json::json!("m-1")));
        assert_eq!(event.fields.get("tokens"), Some(&serde_json::json!(3)));
        assert!(!event.fields.contains_key("message"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_ignores_other_targets() {
        let (layer, mut rx) = GenerationEventLayer::channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "lantern_application::autosave", "[Autosave] Saved");
        });

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_custom_prefix() {
        let (layer, mut rx) = GenerationEventLayer::channel();
        let subscriber =
            tracing_subscriber::registry().with(layer.with_target_prefix("lantern_application"));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "lantern_application::autosave", "[Autosave] Save failed");
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.level, "WARN");
        assert_eq!(event.target, "lantern_application::autosave");
    }
}
