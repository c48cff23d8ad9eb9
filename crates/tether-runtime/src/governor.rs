//! Consecutive-error accounting and the shutdown safety valve.
//!
//! The governor counts consecutive unhandled callback errors. Any
//! successful callback completion resets the counter; reaching the
//! configured maximum cancels the shared shutdown token and moves the
//! state machine to `ShuttingDown`. That transition is terminal: this is
//! a safety valve, not a restart policy.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::logfile::LogManager;

/// Exit code used when shutdown was triggered by the error threshold.
///
/// Distinguishable from a clean stop (exit code 0) by supervisors.
pub const ERROR_THRESHOLD_EXIT_CODE: i32 = 70;

/// Why the runtime stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Manual stop (Ctrl-C / SIGTERM) or the client ended delivery.
    Clean,
    /// The consecutive-error threshold was reached.
    ErrorThreshold,
}

impl ShutdownReason {
    /// The process exit code for this reason.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::ErrorThreshold => ERROR_THRESHOLD_EXIT_CODE,
        }
    }
}

/// Lifecycle of the governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernorState {
    /// Accepting callback outcomes.
    Running,
    /// Threshold reached; the runtime is draining and closing.
    ShuttingDown,
    /// The connection has been closed.
    Stopped,
}

struct GovernorInner {
    consecutive: u32,
    state: GovernorState,
    /// Set when the threshold tripped, so the final reason survives the
    /// transition to `Stopped`.
    tripped: bool,
}

/// Counts consecutive unhandled callback errors and cancels the shutdown
/// token once the configured maximum is reached.
pub struct ErrorGovernor {
    max_errors: u32,
    inner: Mutex<GovernorInner>,
    shutdown: CancellationToken,
    logs: Arc<LogManager>,
}

impl ErrorGovernor {
    /// Creates a governor that trips after `max_errors` consecutive
    /// failures. A maximum of zero is treated as one.
    pub fn new(max_errors: u32, logs: Arc<LogManager>) -> Self {
        Self {
            max_errors: max_errors.max(1),
            inner: Mutex::new(GovernorInner {
                consecutive: 0,
                state: GovernorState::Running,
                tripped: false,
            }),
            shutdown: CancellationToken::new(),
            logs,
        }
    }

    /// The token cancelled when the threshold is reached.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Current state of the governor.
    pub fn state(&self) -> GovernorState {
        self.inner.lock().state
    }

    /// Current consecutive-error count.
    pub fn consecutive_errors(&self) -> u32 {
        self.inner.lock().consecutive
    }

    /// Resets the consecutive counter after a callback completed cleanly.
    pub fn record_success(&self) {
        self.inner.lock().consecutive = 0;
    }

    /// Records an unhandled callback error.
    ///
    /// Logs the error to the run file and the console, even while already
    /// shutting down. Returns `true` when this failure reached the
    /// threshold and triggered shutdown.
    pub fn record_failure(&self, origin: &str, err: &dyn std::fmt::Display) -> bool {
        let counted = {
            let mut inner = self.inner.lock();
            if inner.state != GovernorState::Running {
                // Already shutting down; record but do not count.
                None
            } else {
                inner.consecutive += 1;
                let tripped = inner.consecutive >= self.max_errors;
                if tripped {
                    inner.state = GovernorState::ShuttingDown;
                    inner.tripped = true;
                }
                Some((inner.consecutive, tripped))
            }
        };

        self.logs.error(&format!("{origin}: {err}"));
        let Some((count, tripped)) = counted else {
            error!(origin, error = %err, "callback raised while shutting down");
            return false;
        };
        error!(origin, error = %err, consecutive = count, "callback raised");

        if tripped {
            self.logs.error("too many consecutive errors, shutting down");
            error!(max = self.max_errors, "consecutive error threshold reached, shutting down");
            self.shutdown.cancel();
        }
        tripped
    }

    /// Marks the governor stopped once the connection is closed.
    pub fn mark_stopped(&self) {
        self.inner.lock().state = GovernorState::Stopped;
    }

    /// The reason the run ended, derived from whether the threshold ever
    /// tripped.
    pub fn shutdown_reason(&self) -> ShutdownReason {
        if self.inner.lock().tripped {
            ShutdownReason::ErrorThreshold
        } else {
            ShutdownReason::Clean
        }
    }
}

impl std::fmt::Debug for ErrorGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ErrorGovernor")
            .field("max_errors", &self.max_errors)
            .field("consecutive", &inner.consecutive)
            .field("state", &inner.state)
            .finish()
    }
}
