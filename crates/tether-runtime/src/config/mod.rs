//! Configuration module for the Tether runtime.
//!
//! The configuration is one flat JSON file the store both reads and
//! writes: created with defaults on first run, rewritten in full on every
//! mutation so it is valid JSON at all times.

pub mod error;
pub mod schema;
pub mod store;

pub use error::{ConfigError, ConfigResult};
pub use schema::BotConfig;
pub use store::{ConfigStore, DEFAULT_CONFIG_PATH};
