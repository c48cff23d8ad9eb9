//! File-backed run log with startup retention pruning.
//!
//! One log file per run, named after the moment the run started. Each
//! write opens, appends, flushes, and closes the handle, so a killed
//! process never leaves a truncated buffer behind. Pruning happens once
//! at startup and never during a run.
//!
//! This is deliberately separate from the console `tracing` output (see
//! [`logging`](crate::logging)): the file format and retention behavior
//! here are part of the harness contract.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Local;
use tracing::{debug, warn};

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Routine progress.
    Info,
    /// An error worth keeping.
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes timestamped log lines to this run's file and prunes expired
/// files at startup.
pub struct LogManager {
    dir: PathBuf,
    file: PathBuf,
    retention: Duration,
}

impl LogManager {
    /// Creates the log directory if needed and picks this run's file name.
    pub fn new(dir: impl AsRef<Path>, retention_days: f64) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let file = dir.join(format!("{stamp}.log"));
        // Saturate rather than panic on retention values too large for a
        // Duration.
        let retention = Duration::try_from_secs_f64(retention_days.max(0.0) * 86_400.0)
            .unwrap_or(Duration::MAX);

        Ok(Self {
            dir,
            file,
            retention,
        })
    }

    /// The file this run logs to.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Appends one `[timestamp] [LEVEL] message` line.
    ///
    /// Write failures are reported on the console and swallowed; logging
    /// must never take the bot down.
    pub fn log(&self, level: LogLevel, message: &str) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{stamp}] [{}] {message}\n", level.as_str());
        if let Err(e) = self.append(&line) {
            warn!(file = %self.file.display(), error = %e, "failed to write log line");
        }
    }

    /// Appends an info line.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Appends an error line.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }

    /// Deletes log files older than the retention window.
    ///
    /// Run once at startup; files are never pruned mid-run.
    pub fn prune(&self) {
        let Some(cutoff) = SystemTime::now().checked_sub(self.retention) else {
            return;
        };
        self.prune_before(cutoff);
    }

    /// Deletes files in the log directory modified before `cutoff`.
    ///
    /// Per-file failures (permissions, in-use) are logged and skipped.
    fn prune_before(&self, cutoff: SystemTime) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot scan log directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path == self.file || !path.is_file() {
                continue;
            }
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "cannot stat log file, skipping");
                    continue;
                }
            };
            if modified < cutoff {
                match fs::remove_file(&path) {
                    Ok(()) => debug!(file = %path.display(), "pruned expired log file"),
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "failed to delete expired log file, skipping");
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("file", &self.file)
            .field("retention", &self.retention)
            .finish()
    }
}
