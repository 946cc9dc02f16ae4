// Progress Log - timestamped milestone entries shared by every stage
//
// Stages receive a `&dyn ProgressLog` instead of writing to a fixed path.

use chrono::{Local, NaiveDateTime};
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Timestamp layout of every log line, e.g. `2024-Mar-05-14:07:33`
pub const TIMESTAMP_FORMAT: &str = "%Y-%b-%d-%H:%M:%S";

/// Capability to record one milestone message
pub trait ProgressLog {
    fn record(&self, message: &str);
}

/// Format a single log line (including the trailing newline)
pub fn format_entry(at: NaiveDateTime, message: &str) -> String {
    format!("{} : {}\n", at.format(TIMESTAMP_FORMAT), message)
}

// ============================================================================
// FILE LOG
// ============================================================================

/// Append-only text log. The file is opened, written and closed per message.
#[derive(Debug, Clone)]
pub struct FileProgressLog {
    path: PathBuf,
}

impl FileProgressLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileProgressLog {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl ProgressLog for FileProgressLog {
    fn record(&self, message: &str) {
        tracing::info!("{}", message);

        let line = format_entry(Local::now().naive_local(), message);
        if let Err(e) = self.append(&line) {
            // A broken log file must not take the run down with it
            tracing::warn!("could not write to {}: {}", self.path.display(), e);
        }
    }
}

// ============================================================================
// MEMORY LOG
// ============================================================================

/// Keeps messages in memory, in order. Used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryProgressLog {
    entries: RefCell<Vec<String>>,
}

impl MemoryProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ProgressLog for MemoryProgressLog {
    fn record(&self, message: &str) {
        tracing::debug!("{}", message);
        self.entries.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_entry_format_uses_abbreviated_month() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 33)
            .unwrap();

        assert_eq!(
            format_entry(at, "Extraction complete."),
            "2024-Mar-05-14:07:33 : Extraction complete.\n"
        );
    }

    #[test]
    fn test_file_log_appends_one_line_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code_log.txt");
        std::fs::write(&path, "earlier run : kept\n").unwrap();

        let log = FileProgressLog::new(&path);
        log.record("first");
        log.record("second");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "earlier run : kept");
        assert!(lines[1].ends_with(" : first"));
        assert!(lines[2].ends_with(" : second"));
    }

    #[test]
    fn test_file_log_survives_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        let log = FileProgressLog::new(dir.path());
        log.record("ignored");
    }

    #[test]
    fn test_memory_log_keeps_order() {
        let log = MemoryProgressLog::new();
        assert!(log.is_empty());

        log.record("a");
        log.record("b");

        assert_eq!(log.entries(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(log.len(), 2);
    }
}
