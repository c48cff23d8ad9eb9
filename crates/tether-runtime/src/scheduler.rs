//! Periodic task driver.
//!
//! One background loop runs all registered periodic tasks sequentially, in
//! registration order, once per interval. Task outcomes feed the error
//! governor; the loop stops when the shared shutdown token is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tether_core::{Context, HookRegistry};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::governor::ErrorGovernor;

/// Spawns the periodic task loop. Returns immediately-finished work when
/// no tasks are registered.
pub(crate) fn spawn_task_loop(
    registry: Arc<HookRegistry>,
    ctx: Context,
    governor: Arc<ErrorGovernor>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if registry.task_count() == 0 {
            debug!("no periodic tasks registered");
            return;
        }
        debug!(tasks = registry.task_count(), ?interval, "periodic task loop started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = time::sleep(interval) => {}
            }

            for task in registry.tasks() {
                // Stop between tasks if the governor tripped mid-pass.
                if shutdown.is_cancelled() {
                    break;
                }
                match task(ctx.clone()).await {
                    Ok(()) => governor.record_success(),
                    Err(e) => {
                        governor.record_failure("periodic task", &e);
                    }
                }
            }
        }
        debug!("periodic task loop stopped");
    })
}
