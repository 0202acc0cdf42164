//! Append-only, date-partitioned audit log.
//!
//! Every pipeline action (successful export, skipped schedulation, failed
//! export) leaves a line in `{base_dir}/{YYYY}/{MM}/{category}.log` so the
//! trail survives process restarts and is never silently lost. This is a
//! domain log, separate from the diagnostic `log`/`env_logger` output.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

/// Handle to the date-partitioned audit log directory.
///
/// Cheap to construct; directories and files are created lazily on the
/// first append of each month/category.
#[derive(Debug, Clone)]
pub struct AuditLog {
    base_dir: PathBuf,
}

impl AuditLog {
    /// Creates a handle rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        AuditLog {
            base_dir: base_dir.into(),
        }
    }

    /// Appends one `[<ISO-8601 timestamp>] <message>` line to the current
    /// month's log file for `category`.
    pub fn append(&self, category: &str, message: &str) -> io::Result<()> {
        let now = Local::now();

        let dir = self
            .base_dir
            .join(now.format("%Y").to_string())
            .join(now.format("%m").to_string());
        fs::create_dir_all(&dir)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(format!("{category}.log")))?;

        writeln!(file, "[{}] {}", now.to_rfc3339(), message)
    }

    /// Base directory the log is rooted at.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
