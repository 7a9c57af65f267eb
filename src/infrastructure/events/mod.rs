//! Event Sink Implementations
//!
//! Provides concrete implementations of ConvergeEventSink:
//! - JsonEventSink: NDJSON output for CI/automation
//!
//! The terminal progress sink lives with the CLI presentation code.

mod json;

pub use json::JsonEventSink;
