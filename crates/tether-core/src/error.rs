//! Unified error types for the Tether core crate.
//!
//! Each concern gets its own thiserror enum and a `*Result` alias.
//! Runtime-level errors (config, orchestration) are defined in
//! `tether-runtime`.

use thiserror::Error;

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors raised while registering a hook, event handler, or slash command.
///
/// These are fatal at registration time: a bot with a bad registration
/// never reaches `run()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A slash command with the same name is already registered.
    #[error("slash command '{name}' is already registered")]
    DuplicateCommand {
        /// The duplicate command name.
        name: String,
    },

    /// The command name does not satisfy the platform's naming rules.
    #[error("invalid command name '{name}': {reason}")]
    InvalidCommandName {
        /// The offending name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A command option is malformed.
    #[error("invalid option '{option}' on command '{command}': {reason}")]
    InvalidOption {
        /// The command the option belongs to.
        command: String,
        /// The offending option name.
        option: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The command description is missing or too long.
    #[error("invalid description for command '{command}': {reason}")]
    InvalidDescription {
        /// The command being registered.
        command: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An event handler was registered under an empty name.
    #[error("event name must not be empty")]
    EmptyEventName,
}

// =============================================================================
// Client Errors
// =============================================================================

/// Errors surfaced by the underlying chat client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Establishing the connection failed.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// Reason for failure.
        reason: String,
    },

    /// The platform rejected the supplied token.
    #[error("login rejected by the platform (invalid token?)")]
    LoginFailure,

    /// Slash command registration with the platform failed.
    #[error("failed to register commands: {0}")]
    CommandRegistration(String),

    /// The connection was closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Any other client-side error.
    #[error("{0}")]
    Other(String),
}

// =============================================================================
// Callback Errors
// =============================================================================

/// An unhandled condition raised inside a user callback.
///
/// Callback errors are recovered locally: the runtime logs them, feeds the
/// error governor, and keeps running until the consecutive-error threshold
/// trips.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CallbackError {
    /// Creates a callback error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying error, keeping it as the source.
    pub fn from_err<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<ClientError> for CallbackError {
    fn from(err: ClientError) -> Self {
        Self::from_err(err)
    }
}

impl From<serde_json::Error> for CallbackError {
    fn from(err: serde_json::Error) -> Self {
        Self::from_err(err)
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for registration operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type every registered callback returns.
pub type CallbackResult = Result<(), CallbackError>;
