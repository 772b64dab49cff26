//! Domain types for the performance log

mod entry;

pub use entry::{EntryType, LogEntry};
