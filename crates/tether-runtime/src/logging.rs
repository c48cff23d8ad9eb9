//! Console logging setup built on `tracing`.
//!
//! Separate from the per-run log file (see [`logfile`](crate::logfile)):
//! console output is for the operator's terminal, the file is the
//! persistent record. `RUST_LOG` overrides the configured level when set.

use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Builder for the console logging subscriber.
///
/// # Example
///
/// ```rust,ignore
/// LoggingBuilder::new()
///     .level(tracing::Level::DEBUG)
///     .directive("hyper=warn")
///     .init();
/// ```
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    directives: Vec<String>,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            directives: Vec::new(),
        }
    }
}

impl LoggingBuilder {
    /// Creates a builder with the default `INFO` level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base log level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Adds a per-target filter directive such as `"hyper=warn"`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn build_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.to_string().to_lowercase()));
        for directive in &self.directives {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
        filter
    }

    /// Installs the subscriber, returning an error if one is already set.
    pub fn try_init(self) -> Result<(), tracing_subscriber::util::TryInitError> {
        tracing_subscriber::registry()
            .with(fmt::layer().compact())
            .with(self.build_filter())
            .try_init()
    }

    /// Installs the subscriber, ignoring an already-installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }
}

/// Installs console logging with default settings.
pub fn init() {
    LoggingBuilder::new().init();
}
