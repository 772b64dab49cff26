//! Event feed - single-writer delivery of host messages to a panel
//!
//! The host pushes [`HostMessage`]s into an [`EventFeed`]; one task drains the
//! channel and applies each message to the shared panel under the write lock,
//! one at a time, in arrival order. Readers (the presentation layer) take the
//! read lock and see the live buffer.

use std::sync::Arc;

use eyre::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use super::types::HostMessage;
use crate::panel::PerfPanel;

/// Default channel capacity (messages)
pub const DEFAULT_FEED_CAPACITY: usize = 10_000;

/// Panel shared between the feed task and readers
pub type SharedPanel = Arc<RwLock<PerfPanel>>;

/// Wrap a panel for sharing with the feed
pub fn share(panel: PerfPanel) -> SharedPanel {
    Arc::new(RwLock::new(panel))
}

/// Handle for the host transport to deliver messages
///
/// Cheap to clone; the feed stops once every handle is dropped.
#[derive(Clone, Debug)]
pub struct EventFeed {
    tx: mpsc::Sender<HostMessage>,
}

impl EventFeed {
    /// Create a feed with the given capacity, returning the receiving end for [`run_feed`]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<HostMessage>) {
        debug!(capacity, "EventFeed::new: creating feed");
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Create a feed with default capacity
    pub fn with_default_capacity() -> (Self, mpsc::Receiver<HostMessage>) {
        Self::new(DEFAULT_FEED_CAPACITY)
    }

    /// Deliver a message, waiting for room in the channel
    pub async fn send(&self, message: HostMessage) -> eyre::Result<()> {
        debug!(kind = message.kind(), "EventFeed::send");
        self.tx
            .send(message)
            .await
            .map_err(|_| eyre::eyre!("Event feed closed"))
    }

    /// Whether the consuming task has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Deliver every JSONL message from `reader`
    ///
    /// Lines are read as they arrive, so an interactive stdin is fed live.
    /// Blank lines are ignored and unparsable lines are skipped with a warning.
    /// Returns `(sent, skipped)`.
    pub async fn send_lines<R: AsyncBufRead + Unpin>(&self, reader: R) -> eyre::Result<(usize, usize)> {
        let mut sent = 0;
        let mut skipped = 0;
        let mut lines = reader.lines();
        let mut index = 0;

        while let Some(line) = lines
            .next_line()
            .await
            .context(format!("Failed to read line {}", index + 1))?
        {
            index += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HostMessage>(&line) {
                Ok(message) => {
                    self.send(message).await?;
                    sent += 1;
                }
                Err(e) => {
                    warn!(line = index, error = %e, "EventFeed::send_lines: skipping unparsable line");
                    skipped += 1;
                }
            }
        }

        debug!(sent, skipped, "EventFeed::send_lines: done");
        Ok((sent, skipped))
    }
}

/// Totals from a completed feed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Messages applied to the panel
    pub processed: u64,
    /// Whether the feed ended on an explicit shutdown rather than disconnection
    pub shutdown: bool,
}

/// Apply one message to the panel
pub fn apply(panel: &mut PerfPanel, message: HostMessage) {
    match message {
        HostMessage::Event { method, params } => {
            panel.handle_message(&method, &params);
        }
        HostMessage::Lifecycle { hook } => panel.notify(hook),
        HostMessage::TogglePause => {
            panel.toggle_pause();
        }
        HostMessage::ClearLogs => panel.clear_logs(),
        HostMessage::Shutdown => {}
    }
}

/// Drain the feed into the panel until shutdown or every sender is gone
pub async fn run_feed(panel: SharedPanel, mut rx: mpsc::Receiver<HostMessage>) -> FeedSummary {
    debug!("run_feed: starting");
    let mut summary = FeedSummary::default();

    while let Some(message) = rx.recv().await {
        if matches!(message, HostMessage::Shutdown) {
            debug!("run_feed: shutdown requested");
            summary.shutdown = true;
            break;
        }
        let mut guard = panel.write().await;
        apply(&mut guard, message);
        summary.processed += 1;
    }

    info!(processed = summary.processed, shutdown = summary.shutdown, "run_feed: feed finished");
    summary
}

/// Spawn [`run_feed`] as a background task
pub fn spawn_feed(panel: SharedPanel, rx: mpsc::Receiver<HostMessage>) -> tokio::task::JoinHandle<FeedSummary> {
    tokio::spawn(run_feed(panel, rx))
}
