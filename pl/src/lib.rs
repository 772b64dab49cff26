//! Perflog - a bounded, pausable performance-timing log
//!
//! Collects timing records from an instrumented process, keeps the newest
//! `limit` of them in arrival order, and lets a viewer pause collection or
//! clear the log. A session-start marker always wipes the log and becomes the
//! first row of the new session, paused or not.
//!
//! # Architecture
//!
//! ```text
//!  host ──HostMessage──▶ EventFeed ──▶ run_feed ──▶ PerfPanel
//!                                                   ├── IngestionGate (Paused / Active)
//!                                                   ├── LogBuffer (FIFO, bounded)
//!                                                   │     └── observers (LogMirror → <dir>/<name>.jsonl)
//!                                                   └── Connection (is_connected)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use perflog::{ConnectionFlag, PerfPanel, DEFAULT_LIMIT};
//!
//! let flag = ConnectionFlag::new(true);
//! let mut panel = PerfPanel::new(Arc::new(flag.clone()), DEFAULT_LIMIT);
//! panel.handle_message("measure", &params);
//! for row in panel.rows() {
//!     println!("{} {}", row.name, row.duration);
//! }
//! ```

pub mod buffer;
pub mod cli;
pub mod config;
pub mod connection;
pub mod domain;
pub mod error;
pub mod events;
pub mod gate;
pub mod mirror;
pub mod panel;

pub use buffer::{BufferChange, ChangeObserver, DEFAULT_LIMIT, LogBuffer};
pub use config::{Config, PersistConfig};
pub use connection::{Connection, ConnectionFlag, LifecycleEvent, LifecycleHook, LifecycleHooks};
pub use domain::{EntryType, LogEntry};
pub use error::ValidationError;
pub use events::{EventFeed, HostMessage, InboundEvent, MethodNames, SharedPanel};
pub use gate::{Admission, IngestionGate, PauseState, Toggle};
pub use mirror::{COMPACT_FACTOR, LogMirror, read_mirror, read_recent, store_path};
pub use panel::{ClearHook, IngestStats, PerfPanel};
