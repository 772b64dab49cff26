//! Event types delivered by the host transport
//!
//! The host forwards two named event kinds from the instrumented process:
//! - `measure` - a timing record, subject to the pause gate
//! - the session-start marker (`JS_require_start` by default) - resets the log
//!
//! Everything the host sends, including lifecycle and control requests, travels
//! as a [`HostMessage`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connection::LifecycleEvent;
use crate::domain::LogEntry;
use crate::error::ValidationError;

/// Default method name for timing records
pub const MEASURE_METHOD: &str = "measure";

/// Default method name for the session-start marker
pub const SESSION_START_METHOD: &str = "JS_require_start";

/// Method names used to classify inbound events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodNames {
    /// Method carrying ordinary timing records
    pub measure: String,

    /// Method carrying the session-start marker
    #[serde(rename = "session-start")]
    pub session_start: String,
}

impl Default for MethodNames {
    fn default() -> Self {
        Self {
            measure: MEASURE_METHOD.to_string(),
            session_start: SESSION_START_METHOD.to_string(),
        }
    }
}

/// A validated inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Ordinary timing record; admitted only while active
    Measure(LogEntry),
    /// Start of a new measurement session; always resets and is always recorded
    SessionStart(LogEntry),
}

impl InboundEvent {
    /// Classify and validate a raw `(method, params)` pair from the host
    pub fn from_message(method: &str, params: &Value, methods: &MethodNames) -> Result<Self, ValidationError> {
        if method == methods.measure {
            Ok(InboundEvent::Measure(LogEntry::from_value(params)?))
        } else if method == methods.session_start {
            Ok(InboundEvent::SessionStart(LogEntry::from_value(params)?))
        } else {
            Err(ValidationError::UnknownMethod {
                method: method.to_string(),
            })
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            InboundEvent::Measure(_) => "Measure",
            InboundEvent::SessionStart(_) => "SessionStart",
        }
    }

    pub fn entry(&self) -> &LogEntry {
        match self {
            InboundEvent::Measure(entry) | InboundEvent::SessionStart(entry) => entry,
        }
    }

    pub fn into_entry(self) -> LogEntry {
        match self {
            InboundEvent::Measure(entry) | InboundEvent::SessionStart(entry) => entry,
        }
    }
}

/// Envelope for everything the host delivers to a panel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HostMessage {
    /// A raw event from the instrumented process, validated on receipt
    Event {
        method: String,
        #[serde(default)]
        params: Value,
    },
    /// A connection lifecycle notification
    Lifecycle { hook: LifecycleEvent },
    /// Presentation-layer request to flip the pause state
    TogglePause,
    /// Presentation-layer request to empty the log
    ClearLogs,
    /// Stop the feed
    Shutdown,
}

impl HostMessage {
    /// Wrap a raw event
    pub fn event(method: impl Into<String>, params: Value) -> Self {
        HostMessage::Event {
            method: method.into(),
            params,
        }
    }

    /// Wrap a typed entry under the default `measure` method
    pub fn measure(entry: &LogEntry) -> Self {
        Self::event(MEASURE_METHOD, entry_value(entry))
    }

    /// Wrap a typed entry under the default session-start method
    pub fn session_start(entry: &LogEntry) -> Self {
        Self::event(SESSION_START_METHOD, entry_value(entry))
    }

    /// Get the message kind name
    pub fn kind(&self) -> &'static str {
        match self {
            HostMessage::Event { .. } => "event",
            HostMessage::Lifecycle { .. } => "lifecycle",
            HostMessage::TogglePause => "toggle-pause",
            HostMessage::ClearLogs => "clear-logs",
            HostMessage::Shutdown => "shutdown",
        }
    }
}

fn entry_value(entry: &LogEntry) -> Value {
    // LogEntry holds only strings, finite floats, bools and a Value; this cannot fail.
    serde_json::to_value(entry).unwrap_or(Value::Null)
}
