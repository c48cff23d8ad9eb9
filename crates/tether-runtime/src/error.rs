//! Runtime-level error types.

use tether_core::{ClientError, RegistrationError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can abort runtime construction or startup.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Loading or persisting the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A hook or slash command was registered incorrectly.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The chat client failed fatally before any session existed.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// The log directory could not be created.
    #[error("failed to prepare log directory: {0}")]
    LogDir(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
