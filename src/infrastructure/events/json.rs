//! JSON Event Sink
//!
//! Outputs converge events as NDJSON for CI/automation consumption.

use crate::domain::ports::{ConvergeEvent, ConvergeEventSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    command: &'static str,
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout(command: &'static str) -> Self {
        Self {
            command,
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a JSON event sink writing to a custom writer (for testing)
    pub fn with_writer<W: Write + Send + 'static>(command: &'static str, writer: W) -> Self {
        Self {
            command,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

impl ConvergeEventSink for JsonEventSink {
    fn on_event(&self, event: ConvergeEvent) {
        let mut json = match serde_json::to_value(&event) {
            Ok(value) => value,
            Err(_) => return,
        };
        if let Some(object) = json.as_object_mut() {
            object.insert(
                "command".to_string(),
                serde_json::Value::String(self.command.to_string()),
            );
        }
        self.write_event(json);
    }

    fn wants_detailed_events(&self) -> bool {
        true // JSON mode wants all events
    }
}
