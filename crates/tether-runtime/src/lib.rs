//! Tether runtime — configuration, logging, scheduling, and the dispatch
//! loop.
//!
//! This crate hosts everything around the callbacks: the JSON
//! configuration store, the per-run log file with retention pruning, the
//! console `tracing` setup, the periodic task scheduler, the
//! consecutive-error governor, and [`TetherRuntime`], the facade a bot
//! binary actually talks to.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use tether_runtime::TetherRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = TetherRuntime::builder().build()?;
//!     bot.on_ready(|_ctx| async {
//!         tracing::info!("connected");
//!         Ok(())
//!     });
//!     let reason = bot.run(MyClient::new()).await?;
//!     std::process::exit(reason.exit_code());
//! }
//! ```

pub mod config;
pub mod error;
pub mod governor;
pub mod logfile;
pub mod logging;
pub mod runtime;

mod scheduler;

// Re-exports
pub use config::{BotConfig, ConfigError, ConfigResult, ConfigStore, DEFAULT_CONFIG_PATH};
pub use error::{RuntimeError, RuntimeResult};
pub use governor::{
    ERROR_THRESHOLD_EXIT_CODE, ErrorGovernor, GovernorState, ShutdownReason,
};
pub use logfile::{LogLevel, LogManager};
pub use logging::LoggingBuilder;
pub use runtime::{RuntimeBuilder, TetherRuntime};
