//! Event ingestion gate
//!
//! Decides per inbound event whether it reaches the buffer:
//!
//! ```text
//!                 toggle (connected)
//!        ┌────────────────────────────────┐
//!        │                                ▼
//!   ┌─────────┐     toggle (always)  ┌────────┐
//!   │ Paused  │ ◀─────────────────── │ Active │
//!   └─────────┘                      └────────┘
//!     │  ▲ toggle (disconnected): no-op
//!     └──┘
//! ```
//!
//! - `Measure` events are appended while `Active` and dropped while `Paused`.
//! - `SessionStart` markers bypass the pause state: the buffer is cleared, the
//!   reset callback runs, and the marker becomes the first entry of the new session.

use tracing::debug;

use crate::buffer::LogBuffer;
use crate::events::InboundEvent;

/// Whether measure events are currently admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    Paused,
    Active,
}

impl PauseState {
    pub fn is_paused(&self) -> bool {
        matches!(self, PauseState::Paused)
    }
}

impl std::fmt::Display for PauseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PauseState::Paused => f.write_str("paused"),
            PauseState::Active => f.write_str("active"),
        }
    }
}

/// Result of a pause toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Active -> Paused
    Paused,
    /// Paused -> Active
    Resumed,
    /// Paused with no connection to resume into; state unchanged
    Unchanged,
}

/// What happened to an inbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Appended to the buffer
    Appended,
    /// Discarded because the gate is paused
    Dropped,
    /// Buffer cleared and the marker appended as its first entry
    SessionReset,
}

/// Pause-gated admission of inbound events
#[derive(Debug, Clone)]
pub struct IngestionGate {
    state: PauseState,
}

impl IngestionGate {
    /// Create a gate, active only if the source is already connected
    pub fn new(connected: bool) -> Self {
        let state = if connected {
            PauseState::Active
        } else {
            PauseState::Paused
        };
        debug!(connected, %state, "IngestionGate::new: initial state");
        Self { state }
    }

    pub fn state(&self) -> PauseState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    /// Flip the pause state
    ///
    /// Resuming requires a connection; pausing always succeeds.
    pub fn toggle(&mut self, connected: bool) -> Toggle {
        let outcome = match self.state {
            PauseState::Paused if connected => {
                self.state = PauseState::Active;
                Toggle::Resumed
            }
            PauseState::Paused => Toggle::Unchanged,
            PauseState::Active => {
                self.state = PauseState::Paused;
                Toggle::Paused
            }
        };
        debug!(connected, ?outcome, state = %self.state, "IngestionGate::toggle");
        outcome
    }

    /// Route a validated event into `buffer`
    ///
    /// `on_reset` runs after the buffer is cleared and before the marker is
    /// appended; it is where callers invalidate position-bound state such as
    /// a row selection.
    pub fn admit(&self, event: InboundEvent, buffer: &mut LogBuffer, on_reset: impl FnOnce()) -> Admission {
        match event {
            InboundEvent::Measure(entry) => {
                if self.is_paused() {
                    debug!(name = %entry.name, "IngestionGate::admit: paused, dropping measure");
                    Admission::Dropped
                } else {
                    buffer.append(entry);
                    Admission::Appended
                }
            }
            InboundEvent::SessionStart(marker) => {
                debug!(name = %marker.name, discarded = buffer.len(), "IngestionGate::admit: session start, resetting");
                reset_session(buffer, on_reset);
                buffer.append(marker);
                Admission::SessionReset
            }
        }
    }
}

/// Clear the buffer and invalidate anything tied to its positions
pub(crate) fn reset_session(buffer: &mut LogBuffer, on_reset: impl FnOnce()) {
    buffer.clear();
    on_reset();
}
