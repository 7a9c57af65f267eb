//! Converge Event Port
//!
//! Provides an observable interface for convergence operations.
//! Enables progress reporting, JSON event streams, and debugging.

use serde::Serialize;

/// A named step of infrastructure or application convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Runtime,
    Network,
    Proxy,
    Namespace,
    Context,
    Manifest,
    Build,
    Start,
    Health,
    Route,
    Teardown,
    Cleanup,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Runtime => "container runtime",
            Stage::Network => "shared network",
            Stage::Proxy => "reverse proxy",
            Stage::Namespace => "namespace",
            Stage::Context => "build context",
            Stage::Manifest => "service manifest",
            Stage::Build => "image build",
            Stage::Start => "containers",
            Stage::Health => "health probe",
            Stage::Route => "route",
            Stage::Teardown => "teardown",
            Stage::Cleanup => "namespace cleanup",
        }
    }
}

/// Event emitted during convergence
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConvergeEvent {
    /// A stage began
    StageStarted { stage: Stage },

    /// A stage finished; `detail` summarises what it did
    StageCompleted {
        stage: Stage,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    /// A stage found nothing to do
    StageSkipped { stage: Stage, reason: String },

    /// A command is about to run on the host (detailed)
    Command {
        #[serde(rename = "line")]
        command: String,
        privileged: bool,
    },

    /// Routing document changed (or was checked)
    RouteChanged {
        domain: String,
        change: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        diff: Option<String>,
    },

    /// A non-fatal problem
    Warning { message: String },
}

/// Trait for receiving converge events
///
/// Implementations can be:
/// - ConsoleEventSink: Progress display in terminal
/// - JsonEventSink: NDJSON event stream for CI
/// - NoopEventSink: Silent operation
pub trait ConvergeEventSink: Send + Sync {
    /// Handle a converge event
    fn on_event(&self, event: ConvergeEvent);

    /// Check if this sink wants detailed events (e.g., every remote command)
    fn wants_detailed_events(&self) -> bool {
        true
    }
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl ConvergeEventSink for NoopEventSink {
    fn on_event(&self, _event: ConvergeEvent) {}

    fn wants_detailed_events(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Test event sink that records all events
    struct RecordingEventSink {
        events: Arc<Mutex<Vec<ConvergeEvent>>>,
    }

    impl ConvergeEventSink for RecordingEventSink {
        fn on_event(&self, event: ConvergeEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn recording_sink_captures_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingEventSink {
            events: events.clone(),
        };

        sink.on_event(ConvergeEvent::StageStarted {
            stage: Stage::Context,
        });
        sink.on_event(ConvergeEvent::Warning {
            message: "slow".to_string(),
        });

        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_string(&ConvergeEvent::StageCompleted {
            stage: Stage::Build,
            detail: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"stage_completed","stage":"build"}"#);
    }

    #[test]
    fn command_text_serializes_as_line() {
        let json = serde_json::to_value(ConvergeEvent::Command {
            command: "docker network ls".to_string(),
            privileged: true,
        })
        .unwrap();
        assert_eq!(json["line"], "docker network ls");
        assert!(json.get("command").is_none());
    }

    #[test]
    fn noop_sink_wants_no_details() {
        assert!(!NoopEventSink.wants_detailed_events());
    }
}
