//! Blueprint generation orchestrator.
//!
//! Drives one generation cycle per distinct request key:
//!
//! ```text
//! idle → requesting → watching → ready
//!            │            │
//!            └──→ error ←─┘
//! ```
//!
//! Submitting a request whose key equals the last dispatched key is a no-op.
//! Submitting a new key cancels the previous cycle (subscription, ticker and
//! any pending requester result) before the new one starts. State is
//! published on a [`tokio::sync::watch`] channel; every write from a cycle's
//! tasks is guarded by that cycle's token.

mod cycle;
mod ticker;

use std::sync::Arc;

use blueprint_core_types::schema::EVENT_DEDUPLICATED;
use blueprint_core_types::{RequestContext, TraceId};
use tokio::runtime::Handle;
use tokio::sync::watch;

pub use cycle::CycleHandle;
use cycle::{CycleDriver, SharedState};
use ticker::Ticker;

use crate::config::OrchestratorConfig;
use crate::errors::{BlueprintError, Result, MISSING_ENGAGEMENT_MESSAGE};
use crate::key::{build_key, RequestKey};
use crate::model::{GenerationRequest, OrchestratorState, OrchestratorStatus};
use crate::service::{GenerationRequester, StatusSubscriber};
use crate::{log_op_error, log_op_start, log_transition};

/// What [`Orchestrator::submit`] did with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new cycle was started and the requester called
    Dispatched,
    /// The key equals the last dispatched key; nothing happened
    Deduplicated,
    /// The engagement id was empty; the state is `error` and no call was made
    Rejected,
}

pub struct Orchestrator {
    requester: Arc<dyn GenerationRequester>,
    subscriber: Arc<dyn StatusSubscriber>,
    config: OrchestratorConfig,
    runtime: Handle,
    shared: Arc<SharedState>,
    failure_message: Arc<str>,
    active: Option<CycleHandle>,
    last_key: Option<RequestKey>,
    trace_id: Option<TraceId>,
}

impl Orchestrator {
    /// Orchestrator bound to the ambient tokio runtime
    ///
    /// # Errors
    ///
    /// `RuntimeUnavailable` when called outside a tokio runtime.
    pub fn new(
        requester: Arc<dyn GenerationRequester>,
        subscriber: Arc<dyn StatusSubscriber>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| BlueprintError::RuntimeUnavailable)?;
        Self::with_runtime(runtime, requester, subscriber, config)
    }

    /// Orchestrator spawning its tasks on `runtime`
    pub fn with_runtime(
        runtime: Handle,
        requester: Arc<dyn GenerationRequester>,
        subscriber: Arc<dyn StatusSubscriber>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let failure_message: Arc<str> = Arc::from(config.job_failure_message.as_str());
        Ok(Self {
            requester,
            subscriber,
            config,
            runtime,
            shared: Arc::new(SharedState::new()),
            failure_message,
            active: None,
            last_key: None,
            trace_id: None,
        })
    }

    /// Stamp every cycle's context with `trace_id`
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Current state snapshot
    pub fn state(&self) -> OrchestratorState {
        self.shared.snapshot()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<OrchestratorState> {
        self.shared.receiver()
    }

    pub fn last_dispatched_key(&self) -> Option<&RequestKey> {
        self.last_key.as_ref()
    }

    pub fn active_cycle(&self) -> Option<&CycleHandle> {
        self.active.as_ref()
    }

    /// Submit the current inputs
    ///
    /// The request is normalized (trimmed, blank items dropped) before its
    /// key is derived, so whitespace-only edits never trigger a new job.
    pub fn submit(&mut self, request: &GenerationRequest) -> SubmitOutcome {
        let request = request.normalized();
        let key = build_key(&request);

        if self.holds_key(&key) {
            tracing::debug!(
                component = module_path!(),
                op = "submit",
                event = EVENT_DEDUPLICATED,
                request_key = %key,
            );
            return SubmitOutcome::Deduplicated;
        }

        let handle = self.start_keyed(request, key);
        if handle.is_cancelled() {
            SubmitOutcome::Rejected
        } else {
            SubmitOutcome::Dispatched
        }
    }

    /// Start a cycle for `request` unconditionally
    ///
    /// The previous cycle, if any, is cancelled first. `request` is used as
    /// given; callers wanting normalization go through [`Self::submit`].
    pub fn start_cycle(&mut self, request: GenerationRequest) -> CycleHandle {
        let key = build_key(&request);
        self.start_keyed(request, key)
    }

    fn start_keyed(&mut self, request: GenerationRequest, key: RequestKey) -> CycleHandle {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }
        self.last_key = Some(key.clone());

        if !request.has_engagement_id() {
            let cycle = self
                .shared
                .begin_cycle(OrchestratorState::rejected(MISSING_ENGAGEMENT_MESSAGE));
            log_op_error!(
                "submit",
                BlueprintError::MissingEngagementId,
                duration_ms = 0u64,
                cycle = cycle
            );
            log_transition!("idle", "error", cycle = cycle);
            let handle = CycleHandle::new(self.context_for(cycle), self.shared.clone());
            handle.cancel();
            return handle;
        }

        let cycle = self.shared.begin_cycle(OrchestratorState::requesting());
        let handle = CycleHandle::new(self.context_for(cycle), self.shared.clone());
        log_op_start!(
            "submit",
            engagement_id = %request.engagement_id,
            request_key = %key,
            cycle = cycle,
            request_id = handle.request_id(),
            trace_id = handle.trace_id().unwrap_or("-")
        );
        log_transition!("idle", "requesting", cycle = cycle);

        if let Some(period) = self.config.tick_interval() {
            handle.attach_ticker(Ticker::spawn(
                &self.runtime,
                period,
                self.shared.clone(),
                cycle,
            ));
        }

        let driver = CycleDriver {
            handle: handle.clone(),
            request,
            requester: self.requester.clone(),
            subscriber: self.subscriber.clone(),
            failure_message: self.failure_message.clone(),
        };
        self.runtime.spawn(driver.run());

        self.active = Some(handle.clone());
        handle
    }

    /// Cancel the active cycle, if any
    ///
    /// A settled cycle keeps its `ready`/`error` state and its key. An
    /// in-flight one is abandoned: the state returns to `idle` and the same
    /// inputs dispatch again.
    pub fn cancel(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.cancel();
        if !self.shared.snapshot().status.is_terminal() {
            self.last_key = None;
            self.shared.begin_cycle(OrchestratorState::idle());
        }
    }

    /// Unmount: cancel everything and return to `idle`
    ///
    /// The dedup memory is cleared, so the same inputs dispatch again.
    pub fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel();
        }
        self.last_key = None;
        self.shared.begin_cycle(OrchestratorState::idle());
    }

    /// Whether `key` is already being served
    ///
    /// True for the last dispatched key while its cycle is live or settled.
    /// A cycle cancelled through its handle mid-flight no longer holds it.
    fn holds_key(&self, key: &RequestKey) -> bool {
        if self.last_key.as_ref() != Some(key) {
            return false;
        }
        self.shared.snapshot().status.is_terminal()
            || self.active.as_ref().is_some_and(CycleHandle::is_current)
    }

    /// Wait until the state is `ready` or `error`
    ///
    /// Returns immediately when it already is. Note that an idle orchestrator
    /// never becomes terminal on its own.
    pub async fn wait_for_terminal(&self) -> OrchestratorState {
        let mut rx = self.shared.receiver();
        let state = match rx.wait_for(|state| state.status.is_terminal()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    /// Wait until the state has `status`
    pub async fn wait_for_status(&self, status: OrchestratorStatus) -> OrchestratorState {
        let mut rx = self.shared.receiver();
        let state = match rx.wait_for(|state| state.status == status).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    fn context_for(&self, cycle: u64) -> RequestContext {
        let context = RequestContext::for_cycle(cycle);
        match &self.trace_id {
            Some(trace_id) => context.with_trace_id(trace_id.clone()),
            None => context,
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.shared.snapshot().status)
            .field("cycle", &self.shared.current_cycle())
            .field("last_key", &self.last_key)
            .finish()
    }
}
