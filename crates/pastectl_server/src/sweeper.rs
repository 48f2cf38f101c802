//! Background task that periodically purges expired pastes.

use pastectl_core::{PasteService, PasteStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Handle to a running sweeper; dropping it leaves the task running.
pub struct SweeperHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for an in-flight sweep to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            tracing::error!("Expiry sweeper task failed: {}", err);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run one expiry sweep on the blocking pool.
///
/// Failures are logged and swallowed so a periodic caller keeps going.
///
/// # Returns
/// Number of pastes removed, or `None` when the sweep failed.
pub async fn run_sweep<S>(service: Arc<PasteService<S>>) -> Option<usize>
where
    S: PasteStore + 'static,
{
    tracing::info!("Running scheduled paste cleanup...");
    match tokio::task::spawn_blocking(move || service.delete_expired()).await {
        Ok(Ok(removed)) => {
            tracing::info!("Scheduled paste cleanup finished ({} removed)", removed);
            Some(removed)
        }
        Ok(Err(err)) => {
            tracing::error!("Scheduler failed to clean up pastes: {}", err);
            None
        }
        Err(err) => {
            tracing::error!("Scheduled paste cleanup panicked: {}", err);
            None
        }
    }
}

/// Spawn a sweeper that calls [`PasteService::delete_expired`] every
/// `period`, starting one full period from now.
///
/// # Returns
/// A [`SweeperHandle`] used to stop the task.
pub fn spawn_sweeper<S>(service: Arc<PasteService<S>>, period: Duration) -> SweeperHandle
where
    S: PasteStore + 'static,
{
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    run_sweep(service.clone()).await;
                }
            }
        }
        tracing::info!("Expiry sweeper stopped");
    });
    tracing::info!("Expiry sweeper scheduled every {:?}", period);
    SweeperHandle { cancel, task }
}
