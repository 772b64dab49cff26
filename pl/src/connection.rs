//! Host connection state and lifecycle hooks
//!
//! The panel never owns the connection to the instrumented process. It only
//! asks whether one exists, through [`Connection`], when it computes its
//! initial pause state and when the pause is toggled.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Read-only view of whether the instrumented process is attached
pub trait Connection: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// Shared boolean connection flag, set by the host and read by the panel
#[derive(Debug, Clone, Default)]
pub struct ConnectionFlag {
    connected: Arc<AtomicBool>,
}

impl ConnectionFlag {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(connected)),
        }
    }

    /// Host side: record an attach or detach
    pub fn set_connected(&self, connected: bool) {
        debug!(connected, "ConnectionFlag::set_connected");
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Connection for ConnectionFlag {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Host lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    /// The instrumented process attached
    Connect,
    /// The instrumented process detached
    Disconnect,
    /// The panel became the visible one
    Activate,
    /// The host finished wiring the panel
    Ready,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Connect => "connect",
            LifecycleEvent::Disconnect => "disconnect",
            LifecycleEvent::Activate => "activate",
            LifecycleEvent::Ready => "ready",
        }
    }
}

/// Callback run on a lifecycle notification
pub type LifecycleHook = Box<dyn Fn() + Send + Sync>;

/// Registration points for lifecycle callbacks
#[derive(Default)]
pub struct LifecycleHooks {
    hooks: HashMap<LifecycleEvent, Vec<LifecycleHook>>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for `event`; hooks run in registration order
    pub fn register(&mut self, event: LifecycleEvent, hook: LifecycleHook) {
        debug!(event = event.as_str(), "LifecycleHooks::register");
        self.hooks.entry(event).or_default().push(hook);
    }

    /// Run every hook registered for `event`, returning how many ran
    pub fn fire(&self, event: LifecycleEvent) -> usize {
        let hooks = self.hooks.get(&event).map(Vec::as_slice).unwrap_or_default();
        debug!(event = event.as_str(), count = hooks.len(), "LifecycleHooks::fire");
        for hook in hooks {
            hook();
        }
        hooks.len()
    }
}

impl std::fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&'static str, usize> = self.hooks.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("LifecycleHooks").field("hooks", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_connection_flag_is_shared() {
        let flag = ConnectionFlag::new(false);
        let view: Arc<dyn Connection> = Arc::new(flag.clone());
        assert!(!view.is_connected());

        flag.set_connected(true);
        assert!(view.is_connected());
    }

    #[test]
    fn test_hooks_fire_only_for_their_event() {
        let connects = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connects);

        let mut hooks = LifecycleHooks::new();
        hooks.register(
            LifecycleEvent::Connect,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(hooks.fire(LifecycleEvent::Connect), 1);
        assert_eq!(hooks.fire(LifecycleEvent::Disconnect), 0);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lifecycle_event_serialization() {
        let json = serde_json::to_string(&LifecycleEvent::Disconnect).unwrap();
        assert_eq!(json, "\"disconnect\"");
        let parsed: LifecycleEvent = serde_json::from_str("\"ready\"").unwrap();
        assert_eq!(parsed, LifecycleEvent::Ready);
    }
}
