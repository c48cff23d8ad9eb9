//! Callback registry.
//!
//! The registry is the in-memory mapping from hook kind to registered
//! callbacks. Registration is the public API surface a bot author uses
//! (via the runtime's forwarding methods); the dispatch side is consumed
//! by the runtime's event loop.
//!
//! Ordering contracts:
//!
//! - Ready hooks and periodic tasks run in registration order.
//! - One event handler per event name; re-registering the same name
//!   replaces the old handler and logs a warning.
//! - Slash command names are unique within one registry; duplicates are
//!   rejected at registration time.
//!
//! Callbacks are stored type-erased as `Arc<dyn Fn(...) -> BoxFuture>` so
//! plain async functions and capturing closures both register with no
//! ceremony.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::warn;

use crate::command::SlashCommand;
use crate::context::Context;
use crate::error::{CallbackResult, RegistrationError, RegistrationResult};
use crate::event::{Event, Interaction};

/// Type-erased callback taking only the context (ready hooks, tasks).
pub type HookFn = Arc<dyn Fn(Context) -> BoxFuture<'static, CallbackResult> + Send + Sync>;

/// Handler for a named platform event.
pub type EventFn =
    Arc<dyn Fn(Context, Event) -> BoxFuture<'static, CallbackResult> + Send + Sync>;

/// Handler for a slash command invocation.
pub type CommandFn =
    Arc<dyn Fn(Context, Interaction) -> BoxFuture<'static, CallbackResult> + Send + Sync>;

/// A registered slash command: the platform spec plus its handler.
#[derive(Clone)]
pub struct CommandEntry {
    /// The declarative spec synced to the platform.
    pub spec: SlashCommand,
    /// The handler invoked on interaction delivery.
    pub handler: CommandFn,
}

/// In-memory mapping from hook kind to registered callbacks.
#[derive(Default)]
pub struct HookRegistry {
    ready_hooks: Vec<HookFn>,
    tasks: Vec<HookFn>,
    event_handlers: HashMap<String, EventFn>,
    // Vec rather than map: registration order is the order specs are
    // synced to the platform.
    commands: Vec<CommandEntry>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a hook that runs once after the client signals ready.
    ///
    /// Multiple hooks run in registration order.
    pub fn on_ready<F, Fut>(&mut self, hook: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.ready_hooks.push(Arc::new(move |ctx| Box::pin(hook(ctx))));
    }

    /// Registers a periodic task.
    ///
    /// Tasks run sequentially in registration order on every scheduler
    /// tick.
    pub fn add_task<F, Fut>(&mut self, task: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.tasks.push(Arc::new(move |ctx| Box::pin(task(ctx))));
    }

    /// Registers a handler for a named platform event.
    ///
    /// Re-registering the same name replaces the previous handler and
    /// logs a warning.
    pub fn on_event<F, Fut>(
        &mut self,
        name: impl Into<String>,
        handler: F,
    ) -> RegistrationResult<()>
    where
        F: Fn(Context, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistrationError::EmptyEventName);
        }
        let boxed: EventFn = Arc::new(move |ctx, event| Box::pin(handler(ctx, event)));
        if self.event_handlers.insert(name.clone(), boxed).is_some() {
            warn!(event = %name, "replacing previously registered event handler");
        }
        Ok(())
    }

    /// Registers a slash command spec with its handler.
    ///
    /// The spec is validated here so a malformed command fails before
    /// `run()`. Command names are unique within one registry.
    pub fn register_command<F, Fut>(
        &mut self,
        spec: SlashCommand,
        handler: F,
    ) -> RegistrationResult<()>
    where
        F: Fn(Context, Interaction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        spec.validate()?;
        if self.commands.iter().any(|entry| entry.spec.name == spec.name) {
            return Err(RegistrationError::DuplicateCommand { name: spec.name });
        }
        self.commands.push(CommandEntry {
            spec,
            handler: Arc::new(move |ctx, interaction| Box::pin(handler(ctx, interaction))),
        });
        Ok(())
    }

    // =========================================================================
    // Dispatch side
    // =========================================================================

    /// Ready hooks in registration order.
    pub fn ready_hooks(&self) -> &[HookFn] {
        &self.ready_hooks
    }

    /// Periodic tasks in registration order.
    pub fn tasks(&self) -> &[HookFn] {
        &self.tasks
    }

    /// Looks up the handler for an event name, if one was registered.
    ///
    /// `None` means the event is simply ignored — the client delivers many
    /// events the user never subscribed to.
    pub fn event_handler(&self, name: &str) -> Option<EventFn> {
        self.event_handlers.get(name).cloned()
    }

    /// Looks up the handler for a slash command name.
    pub fn command_handler(&self, name: &str) -> Option<CommandFn> {
        self.commands
            .iter()
            .find(|entry| entry.spec.name == name)
            .map(|entry| Arc::clone(&entry.handler))
    }

    /// Command specs in registration order, for platform sync.
    pub fn command_specs(&self) -> Vec<SlashCommand> {
        self.commands.iter().map(|entry| entry.spec.clone()).collect()
    }

    /// Number of registered slash commands.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Number of registered periodic tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("ready_hooks", &self.ready_hooks.len())
            .field("tasks", &self.tasks.len())
            .field("event_handlers", &self.event_handlers.len())
            .field("commands", &self.commands.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{BoxedClient, ChatClient, EventSink};
    use crate::error::{CallbackError, ClientResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullClient;

    #[async_trait]
    impl ChatClient for NullClient {
        async fn connect(&self, _token: &str, _sink: EventSink) -> ClientResult<()> {
            Ok(())
        }

        async fn register_commands(&self, _commands: &[SlashCommand]) -> ClientResult<()> {
            Ok(())
        }

        async fn close(&self) -> ClientResult<()> {
            Ok(())
        }
    }

    fn ctx() -> Context {
        let client: BoxedClient = Arc::new(NullClient);
        Context::new(client)
    }

    #[test]
    fn duplicate_command_name_is_rejected() {
        let mut registry = HookRegistry::new();
        registry
            .register_command(SlashCommand::new("ping", "Pong"), |_, _| async { Ok(()) })
            .unwrap();

        let err = registry
            .register_command(SlashCommand::new("ping", "Pong again"), |_, _| async {
                Ok(())
            })
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateCommand {
                name: "ping".into()
            }
        );

        // Distinct names are fine.
        registry
            .register_command(SlashCommand::new("pong", "Ping"), |_, _| async { Ok(()) })
            .unwrap();
        assert_eq!(registry.command_count(), 2);
    }

    #[test]
    fn invalid_command_spec_is_rejected_at_registration() {
        let mut registry = HookRegistry::new();
        let err = registry
            .register_command(SlashCommand::new("Bad Name", "desc"), |_, _| async {
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidCommandName { .. }));
        assert_eq!(registry.command_count(), 0);
    }

    #[test]
    fn unknown_event_lookup_is_none() {
        let registry = HookRegistry::new();
        assert!(registry.event_handler("message_create").is_none());
        assert!(registry.command_handler("ping").is_none());
    }

    #[test]
    fn empty_event_name_is_rejected() {
        let mut registry = HookRegistry::new();
        let err = registry.on_event("", |_, _| async { Ok(()) }).unwrap_err();
        assert_eq!(err, RegistrationError::EmptyEventName);
    }

    #[tokio::test]
    async fn re_registering_an_event_replaces_the_handler() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut registry = HookRegistry::new();
        let c = Arc::clone(&first);
        registry
            .on_event("message_create", move |_, _| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();
        let c = Arc::clone(&second);
        registry
            .on_event("message_create", move |_, _| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();

        let handler = registry.event_handler("message_create").unwrap();
        handler(ctx(), Event::bare("message_create")).await.unwrap();

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tasks_keep_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = HookRegistry::new();
        for id in 0..3 {
            let order = Arc::clone(&order);
            registry.add_task(move |_| {
                let order = Arc::clone(&order);
                async move {
                    order.lock().unwrap().push(id);
                    Ok(())
                }
            });
        }

        for task in registry.tasks() {
            task(ctx()).await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn callback_errors_propagate_to_the_caller() {
        let mut registry = HookRegistry::new();
        registry.on_ready(|_| async { Err(CallbackError::msg("boom")) });

        let hook = &registry.ready_hooks()[0];
        let err = hook(ctx()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
