//! Log mirror - persists the buffer to a JSONL file
//!
//! The mirror follows the buffer through its change observer: every append
//! becomes one line in `<dir>/<name>.jsonl` and every clear truncates the file.
//! On startup the panel restores the newest `limit` entries from it, so a host
//! restart replays the session that was on screen. After a restore the mirror
//! knows the buffer limit and compacts the file back to the newest `limit`
//! lines whenever it grows past `COMPACT_FACTOR * limit`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::buffer::{BufferChange, ChangeObserver};
use crate::domain::LogEntry;

/// Default store name
pub const DEFAULT_STORE_NAME: &str = "logs";

/// File may hold up to this many times the buffer limit before compaction
pub const COMPACT_FACTOR: usize = 2;

/// Path of the store `<dir>/<name>.jsonl`, without touching the filesystem
pub fn store_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    dir.as_ref().join(format!("{}.jsonl", name))
}

/// One persisted line
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MirrorRecord {
    /// When the entry was admitted
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    pub entry: LogEntry,
}

impl MirrorRecord {
    /// Create a new record with current timestamp
    pub fn new(entry: LogEntry) -> Self {
        Self {
            timestamp: Utc::now(),
            entry,
        }
    }
}

/// JSONL mirror of a log buffer
pub struct LogMirror {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    /// Records currently in the file
    lines: usize,
    /// Buffer limit, known once restored
    limit: Option<usize>,
}

impl LogMirror {
    /// Open (creating the directory if needed) the store `<dir>/<name>.jsonl`
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).context(format!("Failed to create mirror directory {}", dir.display()))?;
        let path = store_path(dir, name);
        debug!(?path, "LogMirror::open: opened mirror");
        Ok(Self {
            path,
            writer: None,
            lines: 0,
            limit: None,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .context(format!("Failed to open mirror file {}", self.path.display()))?;
            self.writer = Some(BufWriter::new(file));
        }
        // Just populated above
        self.writer.as_mut().ok_or_else(|| eyre::eyre!("Mirror writer unavailable"))
    }

    /// Append one entry as a JSON line
    pub fn write_entry(&mut self, entry: &LogEntry) -> Result<()> {
        let json = serde_json::to_string(&MirrorRecord::new(entry.clone()))?;
        let writer = self.writer()?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        self.lines += 1;
        Ok(())
    }

    /// Records written since the last restore, compaction or truncate
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Empty the backing file
    pub fn truncate(&mut self) -> Result<()> {
        debug!(path = ?self.path, "LogMirror::truncate");
        self.writer = None;
        File::create(&self.path).context(format!("Failed to truncate mirror file {}", self.path.display()))?;
        self.lines = 0;
        Ok(())
    }

    /// Read back the newest `limit` entries, oldest first
    ///
    /// If the file holds more than `limit` entries it is rewritten to hold
    /// exactly the returned ones. From here on appends compact the file
    /// against the same limit.
    pub fn restore(&mut self, limit: usize) -> Result<Vec<LogEntry>> {
        self.limit = Some(limit);
        Ok(self.compact(limit)?.into_iter().map(|r| r.entry).collect())
    }

    /// Rewrite the file to hold only its newest `limit` records
    pub fn compact(&mut self, limit: usize) -> Result<Vec<MirrorRecord>> {
        let mut records = read_records(&self.path)?;
        if records.len() > limit {
            let excess = records.len() - limit;
            records.drain(..excess);
            debug!(excess, kept = records.len(), "LogMirror::compact: dropping evicted records");
            self.rewrite(&records)?;
        }
        self.lines = records.len();
        Ok(records)
    }

    fn compact_if_oversized(&mut self) -> Result<()> {
        if let Some(limit) = self.limit {
            if self.lines > limit.saturating_mul(COMPACT_FACTOR) {
                self.compact(limit)?;
            }
        }
        Ok(())
    }

    fn rewrite(&mut self, records: &[MirrorRecord]) -> Result<()> {
        self.writer = None;
        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut out = BufWriter::new(File::create(&tmp).context("Failed to create compacted mirror")?);
            for record in records {
                writeln!(out, "{}", serde_json::to_string(record)?)?;
            }
            out.flush()?;
        }
        fs::rename(&tmp, &self.path).context("Failed to replace mirror with compacted copy")?;
        Ok(())
    }

    /// Apply a buffer change; failures are logged, never returned
    pub fn apply(&mut self, change: BufferChange<'_>) {
        let result = match change {
            BufferChange::Appended { entry, .. } => self.write_entry(entry).and_then(|_| self.compact_if_oversized()),
            BufferChange::Cleared { .. } => self.truncate(),
        };
        if let Err(e) = result {
            error!(path = ?self.path, error = %e, "LogMirror: failed to mirror buffer change");
        }
    }

    /// Turn the mirror into a buffer observer
    pub fn into_observer(mut self) -> ChangeObserver {
        Box::new(move |change: BufferChange<'_>| self.apply(change))
    }
}

impl std::fmt::Debug for LogMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogMirror")
            .field("path", &self.path)
            .field("open", &self.writer.is_some())
            .field("lines", &self.lines)
            .field("limit", &self.limit)
            .finish()
    }
}

impl Drop for LogMirror {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

fn read_records(path: &Path) -> Result<Vec<MirrorRecord>> {
    debug!(?path, "read_records: reading mirror file");
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).context(format!("Failed to read mirror file {}", path.display()))?;
    let mut records = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<MirrorRecord>(line) {
            Ok(record) if record.entry.validate().is_ok() => records.push(record),
            Ok(record) => {
                warn!(name = %record.entry.name, "read_records: dropping invalid persisted entry");
            }
            Err(e) => {
                warn!(line, error = %e, "read_records: failed to parse line");
            }
        }
    }

    debug!(count = records.len(), "read_records: loaded records");
    Ok(records)
}

/// Read every entry from a mirror file without opening it for writing
pub fn read_mirror(path: impl AsRef<Path>) -> Result<Vec<LogEntry>> {
    Ok(read_records(path.as_ref())?.into_iter().map(|r| r.entry).collect())
}

/// Read the newest `limit` entries, oldest first, as a restore would see them
///
/// Read-only: neither the file nor its directory is created or rewritten.
pub fn read_recent(path: impl AsRef<Path>, limit: usize) -> Result<Vec<LogEntry>> {
    let mut entries = read_mirror(path)?;
    let excess = entries.len().saturating_sub(limit);
    entries.drain(..excess);
    Ok(entries)
}
