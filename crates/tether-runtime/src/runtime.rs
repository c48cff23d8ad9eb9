//! The runtime facade.
//!
//! [`TetherRuntime`] ties everything together: it loads the configuration,
//! opens the run log, forwards registrations to the [`HookRegistry`], and
//! owns the dispatch loop that routes [`Incoming`] payloads from the
//! client to the registered callbacks.
//!
//! Lifecycle of one `run()`:
//!
//! 1. Resolve the token (fatal if still empty).
//! 2. Prune expired log files.
//! 3. Connect the client (fatal on failure; there is no session to
//!    protect yet).
//! 4. On the first ready signal, sync slash commands, fire ready hooks in
//!    order, and start the periodic task loop.
//! 5. Route events and interactions until the shutdown token is
//!    cancelled, either by a signal or by the error governor.
//! 6. Drain, close the client, and report the [`ShutdownReason`].

use std::path::PathBuf;
use std::sync::Arc;

use tether_core::{
    BoxedClient, CallbackResult, ChatClient, Context, Event, HookRegistry, Incoming, Interaction,
    SlashCommand,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{ConfigStore, DEFAULT_CONFIG_PATH};
use crate::error::RuntimeResult;
use crate::governor::{ErrorGovernor, ShutdownReason};
use crate::logfile::LogManager;
use crate::logging;
use crate::scheduler::spawn_task_loop;

/// Capacity of the client-to-runtime delivery channel.
const DELIVERY_BUFFER: usize = 64;

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`TetherRuntime`].
#[derive(Debug)]
pub struct RuntimeBuilder {
    config_path: PathBuf,
    init_logging: bool,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            init_logging: true,
        }
    }
}

impl RuntimeBuilder {
    /// Uses `path` instead of the default configuration file location.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Skips installing the console `tracing` subscriber, for embedders
    /// that manage their own.
    pub fn without_console_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Loads the configuration, opens the run log, and produces a runtime
    /// ready for registrations.
    pub fn build(self) -> RuntimeResult<TetherRuntime> {
        if self.init_logging {
            logging::init();
        }

        let config = Arc::new(ConfigStore::load(&self.config_path)?);
        let snapshot = config.snapshot();
        let logs = Arc::new(LogManager::new(&snapshot.log_dir, snapshot.log_retention_days)?);

        Ok(TetherRuntime {
            config,
            registry: HookRegistry::new(),
            logs,
        })
    }
}

// =============================================================================
// Runtime
// =============================================================================

/// The bot harness: configuration, logging, registrations, and the
/// dispatch loop.
///
/// # Example
///
/// ```rust,ignore
/// let mut bot = TetherRuntime::builder().build()?;
///
/// bot.on_ready(|_ctx| async {
///     tracing::info!("connected");
///     Ok(())
/// });
/// bot.command(SlashCommand::new("ping", "Replies with pong"), |_ctx, _i| async {
///     Ok(())
/// })?;
///
/// let reason = bot.run(MyClient::new()).await?;
/// std::process::exit(reason.exit_code());
/// ```
pub struct TetherRuntime {
    config: Arc<ConfigStore>,
    registry: HookRegistry,
    logs: Arc<LogManager>,
}

impl TetherRuntime {
    /// Starts building a runtime.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    /// The loaded configuration store.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a hook that runs once after the client signals ready.
    pub fn on_ready<F, Fut>(&mut self, hook: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = CallbackResult> + Send + 'static,
    {
        self.registry.on_ready(hook);
    }

    /// Registers a periodic task driven by the configured interval.
    pub fn add_task<F, Fut>(&mut self, task: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = CallbackResult> + Send + 'static,
    {
        self.registry.add_task(task);
    }

    /// Registers a handler for a named platform event.
    pub fn on_event<F, Fut>(&mut self, name: impl Into<String>, handler: F) -> RuntimeResult<()>
    where
        F: Fn(Context, Event) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = CallbackResult> + Send + 'static,
    {
        self.registry.on_event(name, handler)?;
        Ok(())
    }

    /// Registers a slash command spec with its handler.
    pub fn command<F, Fut>(&mut self, spec: SlashCommand, handler: F) -> RuntimeResult<()>
    where
        F: Fn(Context, Interaction) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = CallbackResult> + Send + 'static,
    {
        self.registry.register_command(spec, handler)?;
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Connects the client and runs the dispatch loop until shutdown.
    ///
    /// Blocks until a signal arrives, the error threshold trips, or the
    /// client stops delivering. The returned reason's
    /// [`exit_code`](ShutdownReason::exit_code) is the recommended process
    /// exit code.
    pub async fn run(self, client: impl ChatClient) -> RuntimeResult<ShutdownReason> {
        self.run_client(Arc::new(client)).await
    }

    async fn run_client(self, client: BoxedClient) -> RuntimeResult<ShutdownReason> {
        let Self {
            config,
            registry,
            logs,
        } = self;

        let token = config.token()?;
        let snapshot = config.snapshot();
        logs.prune();

        let governor = Arc::new(ErrorGovernor::new(
            snapshot.max_consecutive_errors,
            Arc::clone(&logs),
        ));
        let shutdown = governor.shutdown_token();
        tokio::spawn(wait_for_signal(shutdown.clone()));

        let (sink, mut incoming) = mpsc::channel(DELIVERY_BUFFER);
        logs.info("starting bot");
        client.connect(&token, sink).await?;

        let registry = Arc::new(registry);
        let ctx = Context::new(Arc::clone(&client));
        let mut ready_seen = false;
        let mut task_loop = None;

        let reason = loop {
            tokio::select! {
                _ = shutdown.cancelled() => break governor.shutdown_reason(),
                delivered = incoming.recv() => {
                    let Some(payload) = delivered else {
                        warn!("client stopped delivering, shutting down");
                        break governor.shutdown_reason();
                    };
                    match payload {
                        Incoming::Ready => {
                            if ready_seen {
                                debug!("session re-established");
                                continue;
                            }
                            ready_seen = true;
                            on_first_ready(&client, &registry, &ctx, &governor, &logs).await;
                            task_loop = Some(spawn_task_loop(
                                Arc::clone(&registry),
                                ctx.clone(),
                                Arc::clone(&governor),
                                snapshot.task_interval(),
                                shutdown.clone(),
                            ));
                        }
                        Incoming::Event(event) => {
                            dispatch_event(&registry, &ctx, &governor, event).await;
                        }
                        Incoming::Interaction(interaction) => {
                            dispatch_interaction(&registry, &ctx, &governor, interaction).await;
                        }
                        Incoming::ConnectionLost(cause) => {
                            if client.reconnects() {
                                warn!(%cause, "connection lost, client will reconnect");
                            } else {
                                governor.record_failure("connection", &cause);
                            }
                        }
                    }
                }
            }
        };

        shutdown.cancel();
        if let Some(handle) = task_loop {
            if let Err(e) = handle.await {
                warn!(error = %e, "periodic task loop ended abnormally");
            }
        }

        logs.info("stopping bot");
        if let Err(e) = client.close().await {
            warn!(error = %e, "error while closing the client");
        }
        governor.mark_stopped();
        logs.info("bot stopped");
        info!(?reason, "bot stopped");

        Ok(reason)
    }
}

impl std::fmt::Debug for TetherRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TetherRuntime")
            .field("config", &self.config.path())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Dispatch helpers
// =============================================================================

async fn on_first_ready(
    client: &BoxedClient,
    registry: &Arc<HookRegistry>,
    ctx: &Context,
    governor: &Arc<ErrorGovernor>,
    logs: &Arc<LogManager>,
) {
    if registry.command_count() > 0 {
        match client.register_commands(&registry.command_specs()).await {
            Ok(()) => info!(commands = registry.command_count(), "slash commands registered"),
            Err(e) => {
                governor.record_failure("command registration", &e);
            }
        }
    }

    logs.info("bot ready");
    info!("bot ready");

    for hook in registry.ready_hooks() {
        if governor.shutdown_token().is_cancelled() {
            break;
        }
        match hook(ctx.clone()).await {
            Ok(()) => governor.record_success(),
            Err(e) => {
                governor.record_failure("ready hook", &e);
            }
        }
    }
}

async fn dispatch_event(
    registry: &Arc<HookRegistry>,
    ctx: &Context,
    governor: &Arc<ErrorGovernor>,
    event: Event,
) {
    let Some(handler) = registry.event_handler(&event.name) else {
        trace!(event = %event.name, "no handler registered, ignoring");
        return;
    };
    let name = event.name.clone();
    match handler(ctx.clone(), event).await {
        Ok(()) => governor.record_success(),
        Err(e) => {
            governor.record_failure(&format!("event handler '{name}'"), &e);
        }
    }
}

async fn dispatch_interaction(
    registry: &Arc<HookRegistry>,
    ctx: &Context,
    governor: &Arc<ErrorGovernor>,
    interaction: Interaction,
) {
    let Some(handler) = registry.command_handler(&interaction.command) else {
        debug!(command = %interaction.command, "interaction for unknown command, ignoring");
        return;
    };
    let name = interaction.command.clone();
    match handler(ctx.clone(), interaction).await {
        Ok(()) => governor.record_success(),
        Err(e) => {
            governor.record_failure(&format!("command '{name}'"), &e);
        }
    }
}

// =============================================================================
// Signals
// =============================================================================

/// Cancels `shutdown` when Ctrl-C or SIGTERM arrives.
async fn wait_for_signal(shutdown: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
        }
        _ = terminate_signal() => {
            info!("termination signal received, shutting down");
        }
        _ = shutdown.cancelled() => return,
    }
    shutdown.cancel();
}

#[cfg(unix)]
async fn terminate_signal() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "cannot install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::tempdir;
    use tether_core::{CallbackError, ClientResult, EventSink};

    use crate::config::ConfigError;
    use crate::error::RuntimeError;
    use crate::governor::ERROR_THRESHOLD_EXIT_CODE;

    /// Test double that replays a scripted sequence after the ready
    /// signal, then optionally keeps the channel open until shutdown.
    #[derive(Clone)]
    struct ScriptedClient {
        inner: Arc<ScriptedInner>,
    }

    struct ScriptedInner {
        script: Mutex<Vec<Incoming>>,
        hold_open: bool,
        registered: Mutex<Vec<String>>,
        closed: AtomicBool,
    }

    impl ScriptedClient {
        fn new(script: Vec<Incoming>, hold_open: bool) -> Self {
            Self {
                inner: Arc::new(ScriptedInner {
                    script: Mutex::new(script),
                    hold_open,
                    registered: Mutex::new(Vec::new()),
                    closed: AtomicBool::new(false),
                }),
            }
        }

        fn registered(&self) -> Vec<String> {
            self.inner.registered.lock().unwrap().clone()
        }

        fn closed(&self) -> bool {
            self.inner.closed.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn connect(&self, _token: &str, sink: EventSink) -> ClientResult<()> {
            let script = std::mem::take(&mut *self.inner.script.lock().unwrap());
            let hold_open = self.inner.hold_open;
            tokio::spawn(async move {
                if sink.send(Incoming::Ready).await.is_err() {
                    return;
                }
                for payload in script {
                    if sink.send(payload).await.is_err() {
                        return;
                    }
                }
                if hold_open {
                    // Keep delivery alive until the runtime drops its end.
                    sink.closed().await;
                }
            });
            Ok(())
        }

        async fn register_commands(&self, commands: &[SlashCommand]) -> ClientResult<()> {
            self.inner
                .registered
                .lock()
                .unwrap()
                .extend(commands.iter().map(|c| c.name.clone()));
            Ok(())
        }

        async fn close(&self) -> ClientResult<()> {
            self.inner.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Holds the sink open until the gate is notified, then ends delivery.
    struct GatedClient {
        gate: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl ChatClient for GatedClient {
        async fn connect(&self, _token: &str, sink: EventSink) -> ClientResult<()> {
            let gate = Arc::clone(&self.gate);
            tokio::spawn(async move {
                if sink.send(Incoming::Ready).await.is_err() {
                    return;
                }
                gate.notified().await;
            });
            Ok(())
        }

        async fn register_commands(&self, _commands: &[SlashCommand]) -> ClientResult<()> {
            Ok(())
        }

        async fn close(&self) -> ClientResult<()> {
            Ok(())
        }
    }

    fn runtime_in(dir: &Path, max_errors: u32, interval_seconds: f64) -> TetherRuntime {
        let config_path = dir.join("tether.json");
        let config = json!({
            "token": "test-token",
            "max_consecutive_errors": max_errors,
            "task_interval_seconds": interval_seconds,
            "log_dir": dir.join("logs").display().to_string(),
        });
        std::fs::write(&config_path, config.to_string()).unwrap();
        TetherRuntime::builder()
            .config_file(&config_path)
            .without_console_logging()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn failing_task_ends_the_run_with_the_error_reason() {
        let dir = tempdir().unwrap();
        let mut bot = runtime_in(dir.path(), 3, 0.005);
        bot.add_task(|_ctx| async { Err(CallbackError::msg("boom")) });

        let client = ScriptedClient::new(Vec::new(), true);
        let reason = bot.run(client.clone()).await.unwrap();

        assert_eq!(reason, ShutdownReason::ErrorThreshold);
        assert_eq!(reason.exit_code(), ERROR_THRESHOLD_EXIT_CODE);
        assert!(client.closed(), "the client must be closed on the way out");
    }

    #[tokio::test]
    async fn an_interleaved_success_requires_a_fresh_run_of_failures() {
        let dir = tempdir().unwrap();
        let mut bot = runtime_in(dir.path(), 3, 0.005);

        // Fails on every call except the third, so the counter goes
        // 1, 2, 0, 1, 2, 3 and trips on the sixth invocation.
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        bot.add_task(move |_ctx| {
            let n = seen.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 2 {
                    Ok(())
                } else {
                    Err(CallbackError::msg("boom"))
                }
            }
        });

        let reason = bot
            .run(ScriptedClient::new(Vec::new(), true))
            .await
            .unwrap();

        assert_eq!(reason, ShutdownReason::ErrorThreshold);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn ended_delivery_is_a_clean_shutdown() {
        let dir = tempdir().unwrap();
        let bot = runtime_in(dir.path(), 5, 60.0);

        let client = ScriptedClient::new(Vec::new(), false);
        let reason = bot.run(client.clone()).await.unwrap();

        assert_eq!(reason, ShutdownReason::Clean);
        assert_eq!(reason.exit_code(), 0);
        assert!(client.closed());
    }

    #[tokio::test]
    async fn unhandled_events_and_unknown_commands_are_ignored() {
        let dir = tempdir().unwrap();
        let bot = runtime_in(dir.path(), 5, 60.0);

        let script = vec![
            Incoming::Event(Event::bare("member_join")),
            Incoming::Interaction(Interaction::new("nope")),
        ];
        let reason = bot
            .run(ScriptedClient::new(script, false))
            .await
            .unwrap();

        assert_eq!(reason, ShutdownReason::Clean);
    }

    #[tokio::test]
    async fn interactions_reach_the_registered_command_handler() {
        let dir = tempdir().unwrap();
        let mut bot = runtime_in(dir.path(), 5, 60.0);

        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        bot.command(SlashCommand::new("ping", "Replies with pong"), move |_ctx, i| {
            let seen = Arc::clone(&seen);
            async move {
                assert_eq!(i.command, "ping");
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();

        let client = ScriptedClient::new(
            vec![Incoming::Interaction(Interaction::new("ping"))],
            false,
        );
        bot.run(client.clone()).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(client.registered(), vec!["ping".to_string()]);
    }

    #[tokio::test]
    async fn event_handlers_receive_their_named_events() {
        let dir = tempdir().unwrap();
        let mut bot = runtime_in(dir.path(), 5, 60.0);

        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        bot.on_event("message_create", move |_ctx, event| {
            let seen = Arc::clone(&seen);
            async move {
                assert_eq!(event.name, "message_create");
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();

        let script = vec![
            Incoming::Event(Event::bare("message_create")),
            Incoming::Event(Event::bare("typing_start")),
            Incoming::Event(Event::bare("message_create")),
        ];
        bot.run(ScriptedClient::new(script, false)).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn ready_hooks_fire_only_for_the_first_ready_signal() {
        let dir = tempdir().unwrap();
        let mut bot = runtime_in(dir.path(), 5, 60.0);

        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&fired);
        bot.on_ready(move |_ctx| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        // A self-reconnecting client may signal ready again mid-run.
        let script = vec![Incoming::Ready];
        bot.run(ScriptedClient::new(script, false)).await.unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn connection_loss_counts_toward_the_threshold() {
        let dir = tempdir().unwrap();
        let bot = runtime_in(dir.path(), 1, 60.0);

        let script = vec![Incoming::ConnectionLost("gateway closed".into())];
        let reason = bot
            .run(ScriptedClient::new(script, true))
            .await
            .unwrap();

        assert_eq!(reason, ShutdownReason::ErrorThreshold);
    }

    #[tokio::test]
    async fn empty_token_refuses_to_run() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tether.json");
        std::fs::write(
            &config_path,
            json!({"log_dir": dir.path().join("logs").display().to_string()}).to_string(),
        )
        .unwrap();

        let bot = TetherRuntime::builder()
            .config_file(&config_path)
            .without_console_logging()
            .build()
            .unwrap();
        let err = bot.run(ScriptedClient::new(Vec::new(), true)).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::MissingToken { .. })
        ));
    }

    #[tokio::test]
    async fn a_panicking_task_does_not_take_down_run() {
        let dir = tempdir().unwrap();
        let mut bot = runtime_in(dir.path(), 5, 0.001);

        let gate = Arc::new(tokio::sync::Notify::new());
        let fuse = Arc::clone(&gate);
        bot.add_task(move |_ctx| {
            let fuse = Arc::clone(&fuse);
            async move {
                fuse.notify_one();
                panic!("task exploded");
            }
        });

        // The loop task dies on the panic; run must still drain and report
        // a clean stop once delivery ends.
        let reason = bot.run(GatedClient { gate }).await.unwrap();
        assert_eq!(reason, ShutdownReason::Clean);
    }

    #[tokio::test]
    async fn failing_ready_hooks_feed_the_governor() {
        let dir = tempdir().unwrap();
        let mut bot = runtime_in(dir.path(), 2, 60.0);
        bot.on_ready(|_ctx| async { Err(CallbackError::msg("boom")) });
        bot.on_ready(|_ctx| async { Err(CallbackError::msg("boom")) });

        let reason = bot
            .run(ScriptedClient::new(Vec::new(), true))
            .await
            .unwrap();
        assert_eq!(reason, ShutdownReason::ErrorThreshold);
    }

    #[tokio::test]
    async fn dispatch_loop_drains_a_busy_script_promptly() {
        let dir = tempdir().unwrap();
        let bot = runtime_in(dir.path(), 5, 60.0);
        let script = (0..100)
            .map(|i| Incoming::Event(Event::bare(format!("event_{i}"))))
            .collect();

        let reason = tokio::time::timeout(
            Duration::from_secs(5),
            bot.run(ScriptedClient::new(script, false)),
        )
        .await
        .expect("dispatch loop must drain the script promptly")
        .unwrap();
        assert_eq!(reason, ShutdownReason::Clean);
    }
}
