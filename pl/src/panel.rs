//! Performance log panel - one session's worth of state
//!
//! `PerfPanel` owns the buffer and the ingestion gate, reads connection state
//! through a [`Connection`], and exposes the control surface the presentation
//! layer drives:
//!
//! | operation        | method                       |
//! |------------------|------------------------------|
//! | rows             | [`PerfPanel::rows`]          |
//! | pause state      | [`PerfPanel::is_paused`]     |
//! | toggle pause     | [`PerfPanel::toggle_pause`]  |
//! | clear logs       | [`PerfPanel::clear_logs`]    |
//! | connection state | [`PerfPanel::is_connected`]  |
//!
//! Nothing here is global: drop the panel and the session is gone.

use std::collections::VecDeque;
use std::sync::Arc;

use eyre::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::buffer::{ChangeObserver, LogBuffer};
use crate::config::Config;
use crate::connection::{Connection, LifecycleEvent, LifecycleHook, LifecycleHooks};
use crate::domain::LogEntry;
use crate::events::{InboundEvent, MethodNames};
use crate::gate::{self, Admission, IngestionGate, PauseState, Toggle};
use crate::mirror::LogMirror;

/// Callback run whenever the log is cleared, manually or by a session reset
pub type ClearHook = Box<dyn Fn() + Send + Sync>;

/// Counters for what happened to inbound events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub appended: u64,
    pub dropped: u64,
    pub session_resets: u64,
    pub rejected: u64,
}

/// A live, pausable performance log for one session
pub struct PerfPanel {
    buffer: LogBuffer,
    gate: IngestionGate,
    connection: Arc<dyn Connection>,
    methods: MethodNames,
    clear_hooks: Vec<ClearHook>,
    lifecycle: LifecycleHooks,
    stats: IngestStats,
}

impl PerfPanel {
    /// Create a panel with the given buffer limit
    ///
    /// Starts active if the connection is already up, paused otherwise.
    pub fn new(connection: Arc<dyn Connection>, limit: usize) -> Self {
        let connected = connection.is_connected();
        debug!(limit, connected, "PerfPanel::new: called");
        Self {
            buffer: LogBuffer::new(limit),
            gate: IngestionGate::new(connected),
            connection,
            methods: MethodNames::default(),
            clear_hooks: Vec::new(),
            lifecycle: LifecycleHooks::new(),
            stats: IngestStats::default(),
        }
    }

    /// Create a panel from configuration, restoring and attaching the mirror if enabled
    pub fn with_config(config: &Config, connection: Arc<dyn Connection>) -> Result<Self> {
        let mut panel = Self::new(connection, config.limit).with_methods(config.methods.clone());

        if config.persist.enabled {
            let mut mirror = LogMirror::open(&config.persist.dir, &config.persist.name)?;
            let restored = mirror.restore(panel.buffer.limit())?;
            info!(count = restored.len(), path = ?mirror.path(), "PerfPanel: restored persisted rows");
            panel.buffer.seed(restored);
            panel.buffer.on_change(mirror.into_observer());
        }

        Ok(panel)
    }

    /// Builder: override the inbound method names
    pub fn with_methods(mut self, methods: MethodNames) -> Self {
        self.methods = methods;
        self
    }

    /// Live view of the retained rows, oldest first
    pub fn rows(&self) -> &VecDeque<LogEntry> {
        self.buffer.rows()
    }

    /// The underlying buffer
    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    pub fn pause_state(&self) -> PauseState {
        self.gate.state()
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    /// Pass-through to the host connection
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Flip between paused and active; resuming needs a live connection
    pub fn toggle_pause(&mut self) -> Toggle {
        let outcome = self.gate.toggle(self.connection.is_connected());
        if outcome == Toggle::Unchanged {
            debug!("PerfPanel::toggle_pause: not connected, staying paused");
        }
        outcome
    }

    /// Empty the log and invalidate any selection, without recording a marker
    pub fn clear_logs(&mut self) {
        debug!(rows = self.buffer.len(), "PerfPanel::clear_logs: called");
        let hooks = &self.clear_hooks;
        gate::reset_session(&mut self.buffer, || run_clear_hooks(hooks));
    }

    /// Register a callback run on every clear (e.g. drop a row selection)
    pub fn on_clear(&mut self, hook: ClearHook) {
        self.clear_hooks.push(hook);
    }

    /// Register an observer of buffer appends and clears
    pub fn on_change(&mut self, observer: ChangeObserver) {
        self.buffer.on_change(observer);
    }

    /// Register a lifecycle hook
    pub fn on_lifecycle(&mut self, event: LifecycleEvent, hook: LifecycleHook) {
        self.lifecycle.register(event, hook);
    }

    /// Deliver a lifecycle notification to registered hooks
    pub fn notify(&self, event: LifecycleEvent) {
        debug!(event = event.as_str(), "PerfPanel::notify");
        self.lifecycle.fire(event);
    }

    /// Route a validated event through the gate
    pub fn ingest(&mut self, event: InboundEvent) -> Admission {
        let hooks = &self.clear_hooks;
        let admission = self.gate.admit(event, &mut self.buffer, || run_clear_hooks(hooks));
        match admission {
            Admission::Appended => self.stats.appended += 1,
            Admission::Dropped => self.stats.dropped += 1,
            Admission::SessionReset => self.stats.session_resets += 1,
        }
        admission
    }

    /// Validate and route a raw host message
    ///
    /// Malformed events are logged and dropped; `None` means the event was rejected.
    pub fn handle_message(&mut self, method: &str, params: &Value) -> Option<Admission> {
        match InboundEvent::from_message(method, params, &self.methods) {
            Ok(event) => Some(self.ingest(event)),
            Err(e) => {
                self.stats.rejected += 1;
                warn!(method, field = e.field(), error = %e, "PerfPanel::handle_message: rejected malformed event");
                None
            }
        }
    }
}

fn run_clear_hooks(hooks: &[ClearHook]) {
    for hook in hooks {
        hook();
    }
}

impl std::fmt::Debug for PerfPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerfPanel")
            .field("buffer", &self.buffer)
            .field("state", &self.gate.state())
            .field("connected", &self.connection.is_connected())
            .field("methods", &self.methods)
            .field("clear_hooks", &self.clear_hooks.len())
            .field("lifecycle", &self.lifecycle)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionFlag;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn panel(connected: bool, limit: usize) -> (PerfPanel, ConnectionFlag) {
        let flag = ConnectionFlag::new(connected);
        (PerfPanel::new(Arc::new(flag.clone()), limit), flag)
    }

    fn measure(name: &str) -> Value {
        json!({"name": name, "entryType": "measure", "startTime": 1.0, "duration": 0.5, "isBase": false})
    }

    fn names(panel: &PerfPanel) -> Vec<String> {
        panel.rows().iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_initial_pause_state_tracks_connection() {
        assert!(panel(false, 10).0.is_paused());
        assert!(!panel(true, 10).0.is_paused());
    }

    #[test]
    fn test_toggle_reads_connection_at_toggle_time() {
        let (mut panel, flag) = panel(false, 10);
        assert_eq!(panel.toggle_pause(), Toggle::Unchanged);

        flag.set_connected(true);
        assert!(panel.is_connected());
        assert_eq!(panel.toggle_pause(), Toggle::Resumed);
        assert_eq!(panel.pause_state(), PauseState::Active);
    }

    #[test]
    fn test_handle_message_counts_outcomes() {
        let (mut panel, _flag) = panel(true, 10);
        assert_eq!(panel.handle_message("measure", &measure("a")), Some(Admission::Appended));
        assert_eq!(panel.handle_message("measure", &json!({"name": "bad"})), None);
        assert_eq!(panel.handle_message("mystery", &measure("b")), None);

        panel.toggle_pause();
        assert_eq!(panel.handle_message("measure", &measure("c")), Some(Admission::Dropped));
        assert_eq!(
            panel.handle_message("JS_require_start", &measure("M")),
            Some(Admission::SessionReset)
        );

        assert_eq!(names(&panel), vec!["M"]);
        assert_eq!(
            panel.stats(),
            IngestStats {
                appended: 1,
                dropped: 1,
                session_resets: 1,
                rejected: 2,
            }
        );
    }

    #[test]
    fn test_clear_logs_runs_clear_hooks_without_marker() {
        let (mut panel, _flag) = panel(true, 10);
        let cleared = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cleared);
        panel.on_clear(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        panel.handle_message("measure", &measure("a"));
        panel.clear_logs();

        assert!(panel.rows().is_empty());
        assert_eq!(cleared.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_session_reset_runs_clear_hooks() {
        let (mut panel, _flag) = panel(false, 10);
        let cleared = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cleared);
        panel.on_clear(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        panel.handle_message("JS_require_start", &measure("M"));
        assert_eq!(cleared.load(Ordering::SeqCst), 1);
        assert_eq!(names(&panel), vec!["M"]);
    }

    #[test]
    fn test_lifecycle_hooks_fire_on_notify() {
        let (mut panel, _flag) = panel(false, 10);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        panel.on_lifecycle(
            LifecycleEvent::Disconnect,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        panel.notify(LifecycleEvent::Connect);
        panel.notify(LifecycleEvent::Disconnect);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_method_names() {
        let (panel, _flag) = panel(true, 10);
        let mut panel = panel.with_methods(MethodNames {
            measure: "perf".to_string(),
            session_start: "reload".to_string(),
        });
        assert_eq!(panel.handle_message("perf", &measure("a")), Some(Admission::Appended));
        assert_eq!(panel.handle_message("measure", &measure("b")), None);
    }
}
