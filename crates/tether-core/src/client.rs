//! The chat client boundary.
//!
//! The platform protocol (gateway, websockets, command sync, message
//! rendering) is delegated entirely to an external client library. This
//! module defines the capability trait the harness consumes: connect with
//! a token, register slash commands, deliver incoming payloads, close.
//!
//! Delivery uses an [`mpsc`] channel rather than per-event callbacks so
//! the runtime owns a single dispatch loop: the client pushes
//! [`Incoming`] values into the sink; the runtime reads them one at a
//! time and routes them through the registry.
//!
//! # Example
//!
//! ```rust,ignore
//! struct DiscordClient { /* wraps the vendor library */ }
//!
//! #[async_trait]
//! impl ChatClient for DiscordClient {
//!     async fn connect(&self, token: &str, sink: EventSink) -> ClientResult<()> {
//!         let session = self.gateway.login(token).await?;
//!         tokio::spawn(pump_gateway(session, sink));
//!         Ok(())
//!     }
//!     // ...
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::command::SlashCommand;
use crate::error::ClientResult;
use crate::event::{Event, Interaction};

/// Payloads a connected client pushes into the runtime's dispatch loop.
#[derive(Debug, Clone)]
pub enum Incoming {
    /// The session is established. A self-reconnecting client emits this
    /// again after every reconnect; the runtime fires ready hooks only for
    /// the first one.
    Ready,
    /// A named gateway event.
    Event(Event),
    /// A slash command invocation.
    Interaction(Interaction),
    /// The connection dropped; the string describes the cause.
    ConnectionLost(String),
}

/// Channel end the client delivers payloads through.
pub type EventSink = mpsc::Sender<Incoming>;

/// The underlying chat-platform client.
///
/// The harness holds an implementation as a trait object and forwards
/// lifecycle calls to it — composition over inheritance. Implementations
/// must not block: `connect` returns once delivery has started, and the
/// connection itself lives on the client's own tasks.
#[async_trait]
pub trait ChatClient: Send + Sync + 'static {
    /// Establishes the connection and begins delivering payloads to `sink`.
    ///
    /// Implementations must emit [`Incoming::Ready`] once the session is
    /// up. Dropping the sink signals the runtime that delivery has ended
    /// for good.
    async fn connect(&self, token: &str, sink: EventSink) -> ClientResult<()>;

    /// Registers slash commands with the platform.
    ///
    /// Called once after the first ready signal, with every command spec
    /// held by the registry.
    async fn register_commands(&self, commands: &[SlashCommand]) -> ClientResult<()>;

    /// Closes the connection and stops delivery.
    async fn close(&self) -> ClientResult<()>;

    /// Whether the client reconnects on its own.
    ///
    /// When this returns `true`, [`Incoming::ConnectionLost`] is logged
    /// but not counted toward the consecutive-error threshold.
    fn reconnects(&self) -> bool {
        false
    }
}

/// A shared chat client trait object.
pub type BoxedClient = Arc<dyn ChatClient>;
