//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or persisting the configuration.
///
/// All of these are fatal: a bot with a broken configuration never
/// connects.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not valid JSON for the expected schema.
    #[error("configuration file {path} is not valid JSON: {source}")]
    Parse {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Serializing the in-memory configuration failed.
    #[error("failed to serialize configuration: {0}")]
    Serialize(serde_json::Error),

    /// Failed to write the configuration file back to disk.
    #[error("failed to write configuration file {path}: {source}")]
    Write {
        /// The file being written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The token was never filled in.
    #[error("no token configured; fill in \"token\" in {path}")]
    MissingToken {
        /// The configuration file to edit.
        path: PathBuf,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
