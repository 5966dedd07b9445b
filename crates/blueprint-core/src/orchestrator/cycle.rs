//! One request cycle: the requester call, the subscription and the ticker
//! that belong to a single request key.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use blueprint_core_types::schema::EVENT_STALE_DISCARD;
use blueprint_core_types::{RequestContext, TraceId};
use tokio::sync::watch;

use super::ticker::Ticker;
use crate::errors::{BlueprintError, ExError};
use crate::model::{
    BlueprintId, BlueprintJob, GenerationRequest, OrchestratorState, SnapshotOutcome,
};
use crate::service::{GenerationRequester, StatusSubscriber, Subscription, UpdateCallback};
use crate::{log_op_end, log_op_error, log_op_start, log_transition};

/// Result of a guarded state write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CycleWrite {
    Applied,
    Unchanged,
    /// The cycle was superseded; nothing was written
    Stale,
}

/// State shared between the orchestrator and the tasks of its cycles
///
/// `cycle` only ever grows. It is read and advanced while holding the watch
/// channel's lock, so a write guarded by a token can never land after the
/// state for a newer token was installed.
pub(crate) struct SharedState {
    cycle: AtomicU64,
    state_tx: watch::Sender<OrchestratorState>,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        let (state_tx, _) = watch::channel(OrchestratorState::idle());
        Self {
            cycle: AtomicU64::new(0),
            state_tx,
        }
    }

    pub(crate) fn current_cycle(&self) -> u64 {
        self.cycle.load(Ordering::SeqCst)
    }

    pub(crate) fn snapshot(&self) -> OrchestratorState {
        self.state_tx.borrow().clone()
    }

    pub(crate) fn receiver(&self) -> watch::Receiver<OrchestratorState> {
        self.state_tx.subscribe()
    }

    /// Install `initial` as the state of a brand-new cycle and return its token
    pub(crate) fn begin_cycle(&self, initial: OrchestratorState) -> u64 {
        let mut token = 0;
        self.state_tx.send_modify(|state| {
            token = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;
            *state = initial;
        });
        token
    }

    /// Retire `cycle` without installing a new state
    ///
    /// Returns false when a newer cycle already superseded it.
    pub(crate) fn retire(&self, cycle: u64) -> bool {
        let mut retired = false;
        self.state_tx.send_if_modified(|_| {
            retired = self
                .cycle
                .compare_exchange(cycle, cycle + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok();
            false
        });
        retired
    }

    /// Apply `update` only while `cycle` is still the current cycle
    ///
    /// `update` returns whether it changed the state; receivers are only
    /// notified on change.
    pub(crate) fn update_if_current(
        &self,
        cycle: u64,
        update: impl FnOnce(&mut OrchestratorState) -> bool,
    ) -> CycleWrite {
        let mut outcome = CycleWrite::Stale;
        self.state_tx.send_if_modified(|state| {
            if self.cycle.load(Ordering::SeqCst) != cycle {
                return false;
            }
            let changed = update(state);
            outcome = if changed {
                CycleWrite::Applied
            } else {
                CycleWrite::Unchanged
            };
            changed
        });
        outcome
    }
}

pub(crate) struct CycleInner {
    pub(crate) context: RequestContext,
    cancelled: AtomicBool,
    subscription: Mutex<Option<Subscription>>,
    ticker: Mutex<Option<Ticker>>,
    shared: Arc<SharedState>,
}

/// Explicit handle on one generation cycle
///
/// Cloning shares the cycle. [`CycleHandle::cancel`] unsubscribes, stops the
/// ticker and retires the cycle token so late results are discarded. It is
/// idempotent.
#[derive(Clone)]
pub struct CycleHandle {
    inner: Arc<CycleInner>,
}

impl CycleHandle {
    pub(crate) fn new(context: RequestContext, shared: Arc<SharedState>) -> Self {
        Self {
            inner: Arc::new(CycleInner {
                context,
                cancelled: AtomicBool::new(false),
                subscription: Mutex::new(None),
                ticker: Mutex::new(None),
                shared,
            }),
        }
    }

    /// Token of this cycle
    pub fn cycle(&self) -> u64 {
        self.inner.context.cycle
    }

    pub fn request_id(&self) -> &str {
        self.inner.context.request_id.as_str()
    }

    /// Host trace id, when the orchestrator was given one
    pub fn trace_id(&self) -> Option<&str> {
        self.inner.context.trace_id.as_ref().map(TraceId::as_str)
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Whether this cycle still owns the orchestrator state
    pub fn is_current(&self) -> bool {
        !self.is_cancelled() && self.inner.shared.current_cycle() == self.cycle()
    }

    /// Whether a status subscription is currently open for this cycle
    pub fn is_subscribed(&self) -> bool {
        self.inner
            .subscription
            .lock()
            .map(|slot| slot.as_ref().is_some_and(Subscription::is_active))
            .unwrap_or(false)
    }

    pub(crate) fn attach_ticker(&self, ticker: Ticker) {
        if let Ok(mut slot) = self.inner.ticker.lock() {
            if self.is_cancelled() {
                ticker.stop();
                return;
            }
            if let Some(previous) = slot.replace(ticker) {
                previous.stop();
            }
        }
    }

    /// Tear the cycle down
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.shared.retire(self.cycle());

        let subscription = self
            .inner
            .subscription
            .lock()
            .map(|mut slot| slot.take())
            .unwrap_or(None);
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }

        let ticker = self
            .inner
            .ticker
            .lock()
            .map(|mut slot| slot.take())
            .unwrap_or(None);
        if let Some(ticker) = ticker {
            ticker.stop();
        }

        tracing::debug!(
            cycle = self.cycle(),
            request_id = %self.inner.context.request_id,
            "cycle cancelled"
        );
    }
}

impl std::fmt::Debug for CycleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleHandle")
            .field("cycle", &self.cycle())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Everything the driver task needs, owned so it can be moved into the task
pub(crate) struct CycleDriver {
    pub(crate) handle: CycleHandle,
    pub(crate) request: GenerationRequest,
    pub(crate) requester: Arc<dyn GenerationRequester>,
    pub(crate) subscriber: Arc<dyn StatusSubscriber>,
    pub(crate) failure_message: Arc<str>,
}

impl CycleDriver {
    /// `requesting → watching | error`, then hand off to the subscription
    pub(crate) async fn run(self) {
        let cycle = self.handle.cycle();
        let request_id = self.handle.inner.context.request_id.clone();
        let engagement_id = self.request.engagement_id.clone();

        log_op_start!(
            "request_generation",
            engagement_id = %engagement_id,
            cycle = cycle,
            request_id = %request_id
        );
        let started = Instant::now();
        let result = self.requester.request_generation(&self.request).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Err(err) => {
                let message = err.surface_message();
                let ex_err = ExError::from(err).with_request_id(request_id.clone());
                log_op_error!(
                    "request_generation",
                    ex_err,
                    duration_ms = duration_ms,
                    engagement_id = %engagement_id,
                    cycle = cycle,
                    request_id = %request_id
                );
                let write = self
                    .handle
                    .inner
                    .shared
                    .update_if_current(cycle, |state| state.request_failed(message));
                match write {
                    CycleWrite::Applied => {
                        log_transition!("requesting", "error", cycle = cycle);
                    }
                    _ => discard_stale("request_generation", cycle),
                }
            }
            Ok(ticket) => {
                log_op_end!(
                    "request_generation",
                    duration_ms = duration_ms,
                    engagement_id = %engagement_id,
                    blueprint_id = %ticket.blueprint_id,
                    cycle = cycle
                );
                self.open_subscription(ticket.blueprint_id);
            }
        }
    }

    fn open_subscription(&self, blueprint_id: BlueprintId) {
        let cycle = self.handle.cycle();
        let inner = &self.handle.inner;

        // Held until the subscription is stored so `cancel` cannot slip in between
        let Ok(mut slot) = inner.subscription.lock() else {
            return;
        };
        if inner.cancelled.load(Ordering::SeqCst) {
            discard_stale("subscribe", cycle);
            return;
        }
        let write = inner
            .shared
            .update_if_current(cycle, |state| state.start_watching(blueprint_id.clone()));
        if write != CycleWrite::Applied {
            discard_stale("subscribe", cycle);
            return;
        }
        log_transition!(
            "requesting",
            "watching",
            cycle = cycle,
            blueprint_id = %blueprint_id
        );

        log_op_start!("subscribe", blueprint_id = %blueprint_id, cycle = cycle);
        let callback = snapshot_callback(
            inner.shared.clone(),
            cycle,
            blueprint_id.clone(),
            self.failure_message.clone(),
        );
        *slot = Some(self.subscriber.subscribe(&blueprint_id, callback));
    }
}

/// Callback applying snapshots to the state of `cycle`
fn snapshot_callback(
    shared: Arc<SharedState>,
    cycle: u64,
    blueprint_id: BlueprintId,
    failure_message: Arc<str>,
) -> UpdateCallback {
    Arc::new(move |snapshot: Option<BlueprintJob>| {
        let Some(job) = snapshot else {
            tracing::debug!(blueprint_id = %blueprint_id, cycle, "ignoring empty snapshot");
            return;
        };
        let job_status = job.status;

        let mut outcome = SnapshotOutcome::Ignored;
        let mut failure = None;
        let write = shared.update_if_current(cycle, |state| {
            outcome = state.apply_snapshot(job, &failure_message);
            if outcome == SnapshotOutcome::Failed {
                failure = state.error.clone();
            }
            outcome != SnapshotOutcome::Ignored
        });

        if write == CycleWrite::Stale {
            discard_stale("snapshot", cycle);
            return;
        }

        match outcome {
            SnapshotOutcome::Progressed => {
                log_transition!(
                    "watching",
                    "watching",
                    cycle = cycle,
                    job_status = job_status.as_str()
                );
            }
            SnapshotOutcome::Completed => {
                log_transition!(
                    "watching",
                    "ready",
                    cycle = cycle,
                    blueprint_id = %blueprint_id
                );
            }
            SnapshotOutcome::Failed => {
                let err = BlueprintError::JobFailed {
                    blueprint_id: blueprint_id.to_string(),
                    message: failure.unwrap_or_else(|| failure_message.to_string()),
                };
                log_op_error!("watch_job", err, duration_ms = 0u64, cycle = cycle);
                log_transition!("watching", "error", cycle = cycle);
            }
            SnapshotOutcome::Ignored => {
                tracing::debug!(
                    blueprint_id = %blueprint_id,
                    cycle,
                    job_status = job_status.as_str(),
                    "snapshot after terminal state ignored"
                );
            }
        }
    })
}

fn discard_stale(op: &'static str, cycle: u64) {
    let err = ExError::from(BlueprintError::StaleCycle { cycle }).with_op(op);
    tracing::debug!(
        component = module_path!(),
        op = op,
        event = EVENT_STALE_DISCARD,
        cycle = cycle,
        err.kind = ?err.kind(),
        err.code = err.code(),
        message = err.message(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrchestratorStatus;

    #[test]
    fn test_update_if_current_rejects_old_token() {
        let shared = SharedState::new();
        let first = shared.begin_cycle(OrchestratorState::requesting());
        let second = shared.begin_cycle(OrchestratorState::requesting());
        assert!(second > first);

        let write = shared.update_if_current(first, |state| state.request_failed("late"));
        assert_eq!(write, CycleWrite::Stale);
        assert_eq!(shared.snapshot().status, OrchestratorStatus::Requesting);

        let write = shared.update_if_current(second, |state| state.request_failed("now"));
        assert_eq!(write, CycleWrite::Applied);
        assert_eq!(shared.snapshot().error.as_deref(), Some("now"));
    }

    #[test]
    fn test_retire_only_current_cycle() {
        let shared = SharedState::new();
        let first = shared.begin_cycle(OrchestratorState::requesting());
        let second = shared.begin_cycle(OrchestratorState::requesting());

        assert!(!shared.retire(first));
        assert!(shared.retire(second));
        assert_eq!(
            shared.update_if_current(second, |_| true),
            CycleWrite::Stale
        );
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let shared = Arc::new(SharedState::new());
        let cycle = shared.begin_cycle(OrchestratorState::requesting());
        let handle = CycleHandle::new(RequestContext::for_cycle(cycle), shared.clone());

        assert!(handle.is_current());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(!handle.is_current());
    }
}
