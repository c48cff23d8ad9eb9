//! Tether core — the client boundary and callback registry.
//!
//! This crate defines the seam between the Tether harness and whatever
//! chat-platform client library actually speaks the wire protocol:
//!
//! - [`ChatClient`] — the trait an adapter implements (connect, slash
//!   command registration, close). The harness holds it as a trait object
//!   and forwards lifecycle calls to it; no subclassing of the client type
//!   is involved.
//! - [`Incoming`] — the payloads a connected client pushes into the
//!   runtime's dispatch loop.
//! - [`HookRegistry`] — insertion-ordered storage for ready hooks,
//!   periodic tasks, named event handlers, and slash commands, with
//!   registration-time validation so misconfiguration surfaces immediately
//!   rather than on first invocation.
//!
//! The runtime orchestration (config, logging, scheduling, error
//! accounting) lives in `tether-runtime`.

pub mod client;
pub mod command;
pub mod context;
pub mod error;
pub mod event;
pub mod registry;

// Re-exports
pub use client::{BoxedClient, ChatClient, EventSink, Incoming};
pub use command::{CommandOption, OptionKind, SlashCommand};
pub use context::Context;
pub use error::{
    CallbackError, CallbackResult, ClientError, ClientResult, RegistrationError,
    RegistrationResult,
};
pub use event::{Event, Interaction, OptionValue};
pub use registry::{CommandFn, EventFn, HookFn, HookRegistry};
