//! Tether — a convenience harness over chat-platform client libraries.
//!
//! Tether wraps an existing client (anything implementing
//! [`ChatClient`](core::ChatClient)) with the plumbing every bot ends up
//! rebuilding: callback registration, a periodic task loop, a writable
//! JSON configuration file, per-run log files with retention pruning, and
//! an automatic shutdown after too many consecutive callback errors.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use tether::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut bot = TetherRuntime::builder().build()?;
//!
//!     bot.on_ready(|_ctx| async {
//!         tracing::info!("connected");
//!         Ok(())
//!     });
//!
//!     bot.add_task(|_ctx| async {
//!         tracing::info!("periodic pass");
//!         Ok(())
//!     });
//!
//!     bot.command(
//!         SlashCommand::new("greet", "Greets someone")
//!             .option(CommandOption::required("who", "Who to greet", OptionKind::String)),
//!         |_ctx, interaction| async move {
//!             let who = interaction.option("who").and_then(|v| v.as_str()).unwrap_or("world");
//!             tracing::info!("hello, {who}");
//!             Ok(())
//!         },
//!     )?;
//!
//!     let reason = bot.run(MyClient::new()).await?;
//!     std::process::exit(reason.exit_code());
//! }
//! ```
//!
//! The first run creates the configuration file with defaults; fill in
//! the token and start again.

pub use tether_core as core;
pub use tether_runtime as runtime;

/// Common imports for bot binaries.
pub mod prelude {
    pub use tether_core::{
        CallbackError, CallbackResult, ChatClient, ClientError, ClientResult, CommandOption,
        Context, Event, EventSink, Incoming, Interaction, OptionKind, OptionValue, SlashCommand,
    };
    pub use tether_runtime::{
        BotConfig, ConfigStore, LogManager, RuntimeError, RuntimeResult, ShutdownReason,
        TetherRuntime,
    };
    pub use tracing::{debug, error, info, trace, warn};
}
