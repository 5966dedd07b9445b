#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use blueprint_core::errors::{BlueprintError, Result};
use blueprint_core::model::{BlueprintId, BlueprintJob, GenerationRequest, JobError, JobStatus};
use blueprint_core::orchestrator::Orchestrator;
use blueprint_core::service::{
    GenerationRequester, GenerationTicket, StatusSubscriber, Subscription, SubscriptionGate,
    UpdateCallback,
};
use blueprint_core::{OrchestratorConfig, OrchestratorState, OrchestratorStatus};
use tokio::sync::oneshot;

enum Scripted {
    Ticket(String),
    Fail(String),
    Held(oneshot::Receiver<Result<GenerationTicket>>),
}

/// Requester answering from a script, then with `bp-<n>` tickets
#[derive(Default)]
pub struct ScriptedRequester {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedRequester {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn then_ticket(&self, id: &str) {
        self.push(Scripted::Ticket(id.to_string()));
    }

    pub fn then_fail(&self, message: &str) {
        self.push(Scripted::Fail(message.to_string()));
    }

    /// Next call waits until the returned sender answers
    pub fn then_hold(&self) -> oneshot::Sender<Result<GenerationTicket>> {
        let (tx, rx) = oneshot::channel();
        self.push(Scripted::Held(rx));
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, step: Scripted) {
        self.script.lock().unwrap().push_back(step);
    }
}

#[async_trait]
impl GenerationRequester for ScriptedRequester {
    async fn request_generation(&self, request: &GenerationRequest) -> Result<GenerationTicket> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());

        let step = self.script.lock().unwrap().pop_front();
        match step {
            None => Ok(GenerationTicket::new(format!("bp-{}", n))),
            Some(Scripted::Ticket(id)) => Ok(GenerationTicket::new(id)),
            Some(Scripted::Fail(message)) => Err(BlueprintError::RequestFailed { message }),
            Some(Scripted::Held(rx)) => rx.await.unwrap_or_else(|_| {
                Err(BlueprintError::Internal {
                    message: "held response dropped".to_string(),
                })
            }),
        }
    }
}

struct Listener {
    blueprint_id: BlueprintId,
    callback: UpdateCallback,
    gate: SubscriptionGate,
}

/// Subscriber whose snapshots are pushed by the test
#[derive(Default)]
pub struct ManualSubscriber {
    listeners: Mutex<Vec<Arc<Listener>>>,
    subscribed: Mutex<Vec<BlueprintId>>,
    teardowns: Arc<AtomicUsize>,
}

impl ManualSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver `snapshot` to every open subscription of `blueprint_id`
    ///
    /// Returns how many subscriptions received it.
    pub fn push(&self, blueprint_id: &str, snapshot: Option<BlueprintJob>) -> usize {
        let listeners: Vec<_> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.blueprint_id.as_str() == blueprint_id)
            .cloned()
            .collect();

        listeners
            .iter()
            .filter(|l| l.gate.deliver(|| (l.callback)(snapshot.clone())))
            .count()
    }

    pub fn push_status(&self, blueprint_id: &str, status: JobStatus) -> usize {
        self.push(blueprint_id, Some(job(blueprint_id, status)))
    }

    /// Ids passed to `subscribe`, in call order
    pub fn subscribed(&self) -> Vec<String> {
        self.subscribed
            .lock()
            .unwrap()
            .iter()
            .map(|id| id.to_string())
            .collect()
    }

    pub fn open_count(&self, blueprint_id: &str) -> usize {
        self.listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.blueprint_id.as_str() == blueprint_id && l.gate.is_open())
            .count()
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

impl StatusSubscriber for ManualSubscriber {
    fn subscribe(&self, blueprint_id: &BlueprintId, on_update: UpdateCallback) -> Subscription {
        let gate = SubscriptionGate::new();
        self.subscribed.lock().unwrap().push(blueprint_id.clone());
        self.listeners.lock().unwrap().push(Arc::new(Listener {
            blueprint_id: blueprint_id.clone(),
            callback: on_update,
            gate: gate.clone(),
        }));

        let teardowns = self.teardowns.clone();
        Subscription::new(gate, move || {
            teardowns.fetch_add(1, Ordering::SeqCst);
        })
    }
}

pub fn job(blueprint_id: &str, status: JobStatus) -> BlueprintJob {
    BlueprintJob::new(BlueprintId::new(blueprint_id), "acme-1", status)
}

pub fn failed_job(blueprint_id: &str, message: &str) -> BlueprintJob {
    let mut job = job(blueprint_id, JobStatus::Failed);
    job.error = Some(JobError {
        message: message.to_string(),
    });
    job
}

pub fn orchestrator(
    requester: &Arc<ScriptedRequester>,
    subscriber: &Arc<ManualSubscriber>,
    config: OrchestratorConfig,
) -> Orchestrator {
    Orchestrator::new(requester.clone(), subscriber.clone(), config).unwrap()
}

/// Orchestrator without a ticker
pub fn headless(
    requester: &Arc<ScriptedRequester>,
    subscriber: &Arc<ManualSubscriber>,
) -> Orchestrator {
    orchestrator(requester, subscriber, OrchestratorConfig::headless())
}

pub async fn wait_for(orchestrator: &Orchestrator, status: OrchestratorStatus) -> OrchestratorState {
    tokio::time::timeout(Duration::from_secs(5), orchestrator.wait_for_status(status))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", status))
}

/// Let spawned tasks run until `condition` holds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

/// Give spawned tasks a chance to run without expecting any change
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
