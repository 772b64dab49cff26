//! Bounded ordered log buffer
//!
//! Stores admitted entries in arrival order and never holds more than `limit`
//! of them: once full, each append evicts from the head (FIFO). Observers
//! registered with [`LogBuffer::on_change`] see every append and clear, which
//! is how the presentation layer re-renders and how the disk mirror follows
//! along.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::domain::LogEntry;

/// Default maximum number of retained entries
pub const DEFAULT_LIMIT: usize = 200_000;

/// A mutation observed on the buffer
#[derive(Debug, Clone, Copy)]
pub enum BufferChange<'a> {
    /// An entry was added to the tail
    Appended {
        entry: &'a LogEntry,
        /// Buffer length after the append
        len: usize,
        /// Entries evicted from the head by this append
        evicted: usize,
    },
    /// The buffer was emptied
    Cleared {
        /// Number of entries that were removed
        removed: usize,
    },
}

/// Callback invoked after every buffer mutation
pub type ChangeObserver = Box<dyn FnMut(BufferChange<'_>) + Send + Sync>;

/// Append-only, capacity-bounded, ordered log
pub struct LogBuffer {
    rows: VecDeque<LogEntry>,
    limit: usize,
    observers: Vec<ChangeObserver>,
    evicted_total: u64,
}

impl LogBuffer {
    /// Create an empty buffer holding at most `limit` entries
    ///
    /// A limit of zero would make every append a no-op, so it is raised to one.
    pub fn new(limit: usize) -> Self {
        let limit = if limit == 0 {
            warn!("LogBuffer::new: limit of 0 requested, using 1");
            1
        } else {
            limit
        };
        debug!(limit, "LogBuffer::new: creating buffer");
        Self {
            // Grows on demand; the limit may be far larger than a session ever fills.
            rows: VecDeque::with_capacity(limit.min(1024)),
            limit,
            observers: Vec::new(),
            evicted_total: 0,
        }
    }

    /// Maximum number of retained entries
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total entries evicted for capacity since the buffer was created
    pub fn evicted_total(&self) -> u64 {
        self.evicted_total
    }

    /// Live, read-only view of the retained entries, oldest first
    pub fn rows(&self) -> &VecDeque<LogEntry> {
        &self.rows
    }

    /// Iterate retained entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.rows.iter()
    }

    /// Owned copy of the current contents
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.rows.iter().cloned().collect()
    }

    /// Register an observer for appends and clears
    pub fn on_change(&mut self, observer: ChangeObserver) {
        debug!(observers = self.observers.len() + 1, "LogBuffer::on_change: registering observer");
        self.observers.push(observer);
    }

    /// Add an entry to the tail, evicting from the head if over the limit
    ///
    /// Returns the number of entries evicted.
    pub fn append(&mut self, entry: LogEntry) -> usize {
        self.rows.push_back(entry);

        let mut evicted = 0;
        while self.rows.len() > self.limit {
            self.rows.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            self.evicted_total += evicted as u64;
            debug!(evicted, limit = self.limit, "LogBuffer::append: evicted oldest entries");
        }

        let len = self.rows.len();
        if let Some(entry) = self.rows.back() {
            let change = BufferChange::Appended { entry, len, evicted };
            for observer in self.observers.iter_mut() {
                observer(change);
            }
        }
        evicted
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        let removed = self.rows.len();
        debug!(removed, "LogBuffer::clear: called");
        if removed == 0 {
            return;
        }
        self.rows.clear();
        for observer in self.observers.iter_mut() {
            observer(BufferChange::Cleared { removed });
        }
    }

    /// Load entries without notifying observers
    ///
    /// Used to seed a fresh buffer from persisted state; the limit still
    /// applies, keeping the newest entries.
    pub(crate) fn seed(&mut self, entries: impl IntoIterator<Item = LogEntry>) {
        for entry in entries {
            self.rows.push_back(entry);
            if self.rows.len() > self.limit {
                self.rows.pop_front();
            }
        }
        debug!(len = self.rows.len(), "LogBuffer::seed: seeded from persisted entries");
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl std::fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogBuffer")
            .field("len", &self.rows.len())
            .field("limit", &self.limit)
            .field("observers", &self.observers.len())
            .field("evicted_total", &self.evicted_total)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    fn entry(n: usize) -> LogEntry {
        LogEntry::measure(format!("E{}", n), n as f64, 1.0)
    }

    fn names(buffer: &LogBuffer) -> Vec<String> {
        buffer.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_buffer_starts_empty() {
        let buffer = LogBuffer::default();
        assert!(buffer.is_empty());
        assert_eq!(buffer.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_append_evicts_oldest() {
        let mut buffer = LogBuffer::new(3);
        for n in 1..=4 {
            buffer.append(entry(n));
        }
        assert_eq!(names(&buffer), vec!["E2", "E3", "E4"]);
        assert_eq!(buffer.evicted_total(), 1);
    }

    #[test]
    fn test_zero_limit_is_raised_to_one() {
        let mut buffer = LogBuffer::new(0);
        assert_eq!(buffer.limit(), 1);
        buffer.append(entry(1));
        buffer.append(entry(2));
        assert_eq!(names(&buffer), vec!["E2"]);
    }

    #[test]
    fn test_clear_empties_buffer() {
        let mut buffer = LogBuffer::new(10);
        buffer.append(entry(1));
        buffer.append(entry(2));
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.snapshot().is_empty());
    }

    #[test]
    fn test_observers_see_appends_and_clears() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut buffer = LogBuffer::new(2);
        buffer.on_change(Box::new(move |change: BufferChange<'_>| {
            let tag = match change {
                BufferChange::Appended { entry, len, evicted } => format!("+{}:{}:{}", entry.name, len, evicted),
                BufferChange::Cleared { removed } => format!("clear:{}", removed),
            };
            sink.lock().unwrap().push(tag);
        }));

        buffer.append(entry(1));
        buffer.append(entry(2));
        buffer.append(entry(3));
        buffer.clear();
        // Clearing an empty buffer is silent
        buffer.clear();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["+E1:1:0", "+E2:2:0", "+E3:2:1", "clear:2"]
        );
    }

    #[test]
    fn test_seed_respects_limit_without_notifying() {
        let calls = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&calls);

        let mut buffer = LogBuffer::new(2);
        buffer.on_change(Box::new(move |_: BufferChange<'_>| *counter.lock().unwrap() += 1));
        buffer.seed((1..=5).map(entry));

        assert_eq!(names(&buffer), vec!["E4", "E5"]);
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut buffer = LogBuffer::new(5);
        buffer.append(entry(1));
        let snapshot = buffer.snapshot();
        buffer.append(entry(2));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.rows().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_length_never_exceeds_limit(limit in 1usize..50, count in 0usize..200) {
            let mut buffer = LogBuffer::new(limit);
            for n in 0..count {
                buffer.append(entry(n));
                prop_assert!(buffer.len() <= limit);
            }
            prop_assert_eq!(buffer.len(), count.min(limit));
        }

        #[test]
        fn prop_retains_newest_in_arrival_order(limit in 1usize..50, count in 0usize..200) {
            let mut buffer = LogBuffer::new(limit);
            for n in 0..count {
                buffer.append(entry(n));
            }
            let expected: Vec<String> = (count.saturating_sub(limit)..count).map(|n| format!("E{}", n)).collect();
            prop_assert_eq!(names(&buffer), expected);
        }
    }
}
