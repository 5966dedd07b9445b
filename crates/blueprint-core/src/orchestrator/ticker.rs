//! Elapsed-time ticker of a cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::cycle::{CycleWrite, SharedState};

/// Periodic task advancing `elapsed_ms` while its cycle is in flight
///
/// The ticker exits on its own when the cycle reaches a terminal state or is
/// superseded, so the elapsed value freezes at the last tick.
pub(crate) struct Ticker {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Ticker {
    pub(crate) fn spawn(
        runtime: &Handle,
        period: Duration,
        shared: Arc<SharedState>,
        cycle: u64,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let step_ms = period.as_millis() as u64;

        let task = runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => {
                        let write = shared.update_if_current(cycle, |state| {
                            if state.status.is_terminal() {
                                return false;
                            }
                            state.elapsed_ms += step_ms;
                            true
                        });
                        if write != CycleWrite::Applied {
                            tracing::trace!(cycle, "ticker stopped");
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown_tx, task }
    }

    pub(crate) fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        self.task.abort();
    }
}
