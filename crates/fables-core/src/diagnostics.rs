//! Diagnostic log sinks and read-failure coalescing.
//!
//! Entries are written only on edges: binding changes, decisions that fire,
//! end-sequence steps, and the first failure (and recovery) of a query.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use strum::Display;
use tracing::{info, warn};

use crate::config::log::{HEADER_PREFIX, MAX_AGE_DAYS, TIMESTAMP_FORMAT};
use crate::error::{Error, Result};

/// Destination for auto-splitter diagnostics.
pub trait DiagnosticSink {
    fn record(&mut self, message: &str);
}

/// Discards every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _message: &str) {}
}

/// Keeps entries in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|e| e.contains(needle))
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&mut self, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(message.to_string());
        }
    }
}

/// Appends `[YYYY-MM-DD HH:MM:SS] message` lines to a file.
///
/// The first line records when the file was created; a file older than
/// [`MAX_AGE_DAYS`] is truncated on open.
pub struct FileLogSink {
    path: PathBuf,
    file: File,
    write_failed: bool,
}

impl FileLogSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_at(path, Local::now())
    }

    /// Open as if the current time were `now`.
    pub fn open_at<P: AsRef<Path>>(path: P, now: DateTime<Local>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let expired = match read_created(&path)? {
            Some(created) => now.signed_duration_since(created) > Duration::days(MAX_AGE_DAYS),
            None => path.exists(),
        };

        let file = if expired || !path.exists() {
            if expired {
                info!("Recreating diagnostic log {}", path.display());
            }
            let mut file = File::create(&path)?;
            writeln!(file, "{}{}", HEADER_PREFIX, now.format(TIMESTAMP_FORMAT))?;
            file
        } else {
            OpenOptions::new().append(true).open(&path)?
        };

        Ok(Self {
            path,
            file,
            write_failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, now: DateTime<Local>, message: &str) -> std::io::Result<()> {
        writeln!(self.file, "[{}] {}", now.format(TIMESTAMP_FORMAT), message)?;
        self.file.flush()
    }
}

impl DiagnosticSink for FileLogSink {
    fn record(&mut self, message: &str) {
        info!("{}", message);
        match self.write_line(Local::now(), message) {
            Ok(()) => self.write_failed = false,
            Err(e) if !self.write_failed => {
                warn!("Failed to write {}: {}", self.path.display(), e);
                self.write_failed = true;
            }
            Err(_) => {}
        }
    }
}

/// Creation time from the header line, `None` when the file is missing or
/// has no recognizable header.
fn read_created(path: &Path) -> Result<Option<DateTime<Local>>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };

    let mut first = String::new();
    BufReader::new(file).read_line(&mut first)?;
    let Some(stamp) = first.trim_end().strip_prefix(HEADER_PREFIX) else {
        return Ok(None);
    };

    Ok(NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest()))
}

/// Decision queries whose read failures are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Query {
    ShouldStart,
    ShouldSplit,
    ShouldEnd,
}

/// Remembers which queries are currently failing so each outage is logged
/// once on onset and once on recovery.
#[derive(Debug, Clone, Default)]
pub struct ReadHealth {
    failing: HashMap<Query, String>,
}

impl ReadHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed read; returns a message when this is a new failure.
    pub fn failed(&mut self, query: Query, error: &Error) -> Option<String> {
        let message = format!("{}: {}", query, error);
        match self.failing.get(&query) {
            Some(previous) if *previous == message => None,
            _ => {
                self.failing.insert(query, message.clone());
                Some(message)
            }
        }
    }

    /// Record a successful read; returns a message when a failure just ended.
    pub fn succeeded(&mut self, query: Query) -> Option<String> {
        self.failing
            .remove(&query)
            .map(|_| format!("{}: reads recovered", query))
    }

    pub fn is_failing(&self, query: Query) -> bool {
        self.failing.contains_key(&query)
    }

    pub fn clear(&mut self) {
        self.failing.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn at(stamp: &str) -> DateTime<Local> {
        let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    #[test]
    fn test_new_file_gets_header_and_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("splitter.txt");

        let mut sink = FileLogSink::open_at(&path, at("2024-03-01 12:00:00")).unwrap();
        sink.record("STARTED");
        sink.record("LOGIC RESET");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("{}2024-03-01 12:00:00", HEADER_PREFIX));
        assert!(lines[1].starts_with('['));
        assert!(lines[1].ends_with("] STARTED"));
        // "[YYYY-MM-DD HH:MM:SS] " prefix
        assert_eq!(lines[2].find(']'), Some(20));
    }

    #[test]
    fn test_recent_file_is_appended() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("splitter.txt");

        FileLogSink::open_at(&path, at("2024-03-01 12:00:00"))
            .unwrap()
            .record("first");
        FileLogSink::open_at(&path, at("2024-03-20 12:00:00"))
            .unwrap()
            .record("second");

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&format!("{}2024-03-01", HEADER_PREFIX)));
        assert!(content.contains("] first"));
        assert!(content.contains("] second"));
    }

    #[test]
    fn test_expired_file_is_recreated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("splitter.txt");

        FileLogSink::open_at(&path, at("2024-01-01 00:00:00"))
            .unwrap()
            .record("old");
        FileLogSink::open_at(&path, at("2024-02-15 00:00:00"))
            .unwrap()
            .record("new");

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&format!("{}2024-02-15", HEADER_PREFIX)));
        assert!(!content.contains("] old"));
        assert!(content.contains("] new"));
    }

    #[test]
    fn test_file_without_header_is_recreated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("splitter.txt");
        fs::write(&path, "[2020-01-01 00:00:00] legacy entry\n").unwrap();

        FileLogSink::open_at(&path, at("2024-02-15 00:00:00")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("legacy entry"));
    }

    #[test]
    fn test_memory_sink_shares_entries() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.record("Bound");
        assert_eq!(sink.entries(), vec!["Bound".to_string()]);
        assert!(sink.contains("Bou"));
    }

    #[test]
    fn test_read_health_coalesces_failures() {
        let mut health = ReadHealth::new();
        let error = Error::NullPointer { step: 2 };

        assert!(health.succeeded(Query::ShouldStart).is_none());
        let onset = health.failed(Query::ShouldStart, &error).unwrap();
        assert!(onset.starts_with("ShouldStart: "));
        assert!(health.failed(Query::ShouldStart, &error).is_none());
        assert!(health.is_failing(Query::ShouldStart));
        assert!(!health.is_failing(Query::ShouldEnd));

        // A different error is a new onset
        assert!(health.failed(Query::ShouldStart, &Error::NotBound).is_some());

        let recovered = health.succeeded(Query::ShouldStart).unwrap();
        assert_eq!(recovered, "ShouldStart: reads recovered");
        assert!(health.succeeded(Query::ShouldStart).is_none());
    }
}
