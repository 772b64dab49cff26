//! Inbound events and the feed that delivers them
//!
//! The host transport turns whatever it receives from the instrumented process
//! into [`HostMessage`]s and pushes them into an [`EventFeed`]. A single task
//! runs [`run_feed`], applying each message to the shared panel in order.
//!
//! # Architecture
//!
//! ```text
//!   host transport           EventFeed (mpsc)           run_feed
//!  ┌──────────────┐  send   ┌────────────────┐  recv  ┌──────────────────┐
//!  │ measure      │ ──────▶ │ HostMessage    │ ─────▶ │ write lock       │
//!  │ session mark │         │ HostMessage    │        │ PerfPanel::apply │
//!  │ lifecycle    │         │ ...            │        └──────────────────┘
//!  └──────────────┘         └────────────────┘                 │
//!                                                              ▼
//!                                           presentation layer (read lock)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use perflog::events::{EventFeed, HostMessage, share, spawn_feed};
//!
//! let panel = share(PerfPanel::new(connection, DEFAULT_LIMIT));
//! let (feed, rx) = EventFeed::with_default_capacity();
//! let handle = spawn_feed(panel.clone(), rx);
//!
//! feed.send(HostMessage::event("measure", params)).await?;
//! feed.send(HostMessage::Shutdown).await?;
//! handle.await?;
//! ```

mod feed;
mod types;

pub use feed::{DEFAULT_FEED_CAPACITY, EventFeed, FeedSummary, SharedPanel, apply, run_feed, share, spawn_feed};
pub use types::{HostMessage, InboundEvent, MEASURE_METHOD, MethodNames, SESSION_START_METHOD};
