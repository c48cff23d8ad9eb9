//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration structure, persisted as a flat JSON object.
///
/// Built-in keys carry defaults used when absent from the file; any other
/// keys the user adds are preserved verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Authentication token for the chat platform. Empty until the user
    /// fills it in; the runtime refuses to connect with an empty token.
    #[serde(default)]
    pub token: String,

    /// Interval between periodic task passes, in seconds.
    #[serde(default = "default_task_interval")]
    pub task_interval_seconds: f64,

    /// Consecutive unhandled callback errors tolerated before the runtime
    /// shuts itself down.
    #[serde(default = "default_max_errors")]
    pub max_consecutive_errors: u32,

    /// Log files older than this many days are deleted at startup.
    #[serde(default = "default_log_retention")]
    pub log_retention_days: f64,

    /// Directory log files are written to.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// User-defined keys, preserved verbatim in the file.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            task_interval_seconds: default_task_interval(),
            max_consecutive_errors: default_max_errors(),
            log_retention_days: default_log_retention(),
            log_dir: default_log_dir(),
            extra: Map::new(),
        }
    }
}

fn default_task_interval() -> f64 {
    60.0
}

fn default_max_errors() -> u32 {
    5
}

fn default_log_retention() -> f64 {
    7.0
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl BotConfig {
    /// The task interval as a [`Duration`]. Negative values clamp to
    /// zero, values too large for a `Duration` to [`Duration::MAX`].
    pub fn task_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.task_interval_seconds.max(0.0))
            .unwrap_or(Duration::MAX)
    }
}
