//! In-memory generation service.
//!
//! Jobs live in a map guarded by a mutex. Each job owns a broadcast channel;
//! stage updates are sent while the map lock is held, so a subscriber that
//! snapshots the record and subscribes under the same lock never misses or
//! reorders an update.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use async_trait::async_trait;
use blueprint_core::errors::{BlueprintError, Result};
use blueprint_core::model::{
    BlueprintAnalytics, BlueprintFile, BlueprintId, BlueprintJob, ContextSnapshot,
    GenerationRequest, JobError, JobStatus, TimelineEvent,
};
use blueprint_core::service::{
    GenerationRequester, GenerationTicket, StatusSubscriber, Subscription, SubscriptionGate,
    UpdateCallback,
};
use blueprint_core::{log_op_end, log_op_error, log_op_start, log_transition};
use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::catalog::EngagementCatalog;
use crate::config::SimulationConfig;
use crate::payload::{checksum, BlueprintDocument};

const UPDATE_CAPACITY: usize = 16;

struct JobEntry {
    record: BlueprintJob,
    base_path: String,
    created: Instant,
    updates: broadcast::Sender<BlueprintJob>,
}

struct Inner {
    config: SimulationConfig,
    catalog: EngagementCatalog,
    runtime: Handle,
    jobs: Mutex<HashMap<BlueprintId, JobEntry>>,
    requests: AtomicUsize,
}

/// Simulated blueprint generation service
///
/// Implements both [`GenerationRequester`] and [`StatusSubscriber`]. Cloning
/// shares the job store.
#[derive(Clone)]
pub struct SimulatedBlueprintService {
    inner: Arc<Inner>,
}

impl SimulatedBlueprintService {
    /// Service bound to the ambient tokio runtime
    ///
    /// # Errors
    ///
    /// `RuntimeUnavailable` outside a runtime, `InvalidConfig` when `config`
    /// does not validate.
    pub fn new(config: SimulationConfig, catalog: EngagementCatalog) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| BlueprintError::RuntimeUnavailable)?;
        Self::with_runtime(runtime, config, catalog)
    }

    /// # Errors
    ///
    /// `InvalidConfig` when `config` does not validate.
    pub fn with_runtime(
        runtime: Handle,
        config: SimulationConfig,
        catalog: EngagementCatalog,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                catalog,
                runtime,
                jobs: Mutex::new(HashMap::new()),
                requests: AtomicUsize::new(0),
            }),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.inner.config
    }

    /// Number of `request_generation` calls received
    pub fn request_count(&self) -> usize {
        self.inner.requests.load(Ordering::SeqCst)
    }

    /// Latest record of a job
    pub fn job(&self, blueprint_id: &BlueprintId) -> Option<BlueprintJob> {
        self.inner.record(blueprint_id)
    }

    /// All jobs of an engagement, oldest first
    pub fn jobs_for_engagement(&self, engagement_id: &str) -> Vec<BlueprintJob> {
        let Ok(jobs) = self.inner.jobs() else {
            return Vec::new();
        };
        let mut matching: Vec<_> = jobs
            .values()
            .filter(|entry| entry.record.engagement_id == engagement_id)
            .map(|entry| (entry.created, entry.record.clone()))
            .collect();
        matching.sort_by_key(|(created, _)| *created);
        matching.into_iter().map(|(_, record)| record).collect()
    }
}

impl Inner {
    fn jobs(&self) -> Result<MutexGuard<'_, HashMap<BlueprintId, JobEntry>>> {
        self.jobs.lock().map_err(|_| BlueprintError::Internal {
            message: "job store lock poisoned".to_string(),
        })
    }

    fn record(&self, blueprint_id: &BlueprintId) -> Option<BlueprintJob> {
        self.jobs()
            .ok()
            .and_then(|jobs| jobs.get(blueprint_id).map(|entry| entry.record.clone()))
    }

    /// Latest record plus a receiver positioned right after it
    fn watch_job(
        &self,
        blueprint_id: &BlueprintId,
    ) -> Option<(BlueprintJob, broadcast::Receiver<BlueprintJob>)> {
        let jobs = self.jobs().ok()?;
        let entry = jobs.get(blueprint_id)?;
        Some((entry.record.clone(), entry.updates.subscribe()))
    }

    fn create_or_reuse(self: &Arc<Self>, request: &GenerationRequest) -> Result<GenerationTicket> {
        if let Some(message) = &self.config.request_failure {
            return Err(BlueprintError::RequestFailed {
                message: message.clone(),
            });
        }

        let engagement_id = request.engagement_id.trim();
        if engagement_id.is_empty() {
            return Err(BlueprintError::InvalidInput {
                reason: "engagementId is required".to_string(),
            });
        }

        let mut jobs = self.jobs()?;
        if let Some(existing) = self.reusable(&jobs, engagement_id) {
            tracing::info!(
                engagement_id,
                blueprint_id = %existing.id,
                "returning existing blueprint request"
            );
            return Ok(ticket_for(existing));
        }
        self.evict_settled(&mut jobs);

        let now = Utc::now();
        let blueprint_id = BlueprintId::new(format!(
            "bb_{}_{}",
            engagement_id,
            Uuid::now_v7().simple()
        ));
        let base_path = format!(
            "engagementArtifacts/{}/blueprint/{}",
            engagement_id,
            now.timestamp_millis()
        );

        let profile = self.catalog.profile(engagement_id);
        let document = BlueprintDocument::compose(&request.normalized(), &profile);
        let payload = document.summarize(format!("{}/payload.json", base_path))?;

        let mut timeline = profile.timeline.clone();
        timeline.push(TimelineEvent {
            at: now,
            kind: "blueprint".to_string(),
            summary: "Blueprint generation requested".to_string(),
        });

        let record = BlueprintJob {
            customer_name: Some(profile.customer_name.clone()),
            generated_at: Some(now),
            payload: Some(payload),
            analytics: Some(BlueprintAnalytics {
                recommendation_coverage: profile.recommendation_coverage(),
                risk_score: profile.risk_score,
                automation_confidence: profile.automation_confidence,
                recommendation_categories: profile.recommendation_categories.clone(),
                scenario_count: profile.scenario_count,
                notes_count: profile.notes_count,
                transcript_tokens: profile.transcript_tokens,
                delivery_latency_ms: None,
                last_exported_at: None,
            }),
            context_snapshot: Some(ContextSnapshot { timeline }),
            ..BlueprintJob::new(blueprint_id.clone(), engagement_id, JobStatus::Processing)
        };
        let ticket = ticket_for(&record);

        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        jobs.insert(
            blueprint_id.clone(),
            JobEntry {
                record,
                base_path,
                created: Instant::now(),
                updates,
            },
        );
        drop(jobs);

        self.runtime.spawn(progress(self.clone(), blueprint_id));
        Ok(ticket)
    }

    /// Newest non-failed job of the engagement still inside the reuse window
    fn reusable<'a>(
        &self,
        jobs: &'a HashMap<BlueprintId, JobEntry>,
        engagement_id: &str,
    ) -> Option<&'a BlueprintJob> {
        let now = Utc::now();
        let window = self.config.reuse_window();
        jobs.values()
            .filter(|entry| entry.record.engagement_id == engagement_id)
            .filter(|entry| entry.record.status != JobStatus::Failed)
            .filter(|entry| {
                entry
                    .record
                    .generated_at
                    .map_or(true, |at| now.signed_duration_since(at) < window)
            })
            .max_by_key(|entry| entry.created)
            .map(|entry| &entry.record)
    }

    /// Drop terminal jobs that can no longer be reused
    fn evict_settled(&self, jobs: &mut HashMap<BlueprintId, JobEntry>) {
        let now = Utc::now();
        let window = self.config.reuse_window();
        let before = jobs.len();
        jobs.retain(|_, entry| {
            !entry.record.status.is_terminal()
                || entry
                    .record
                    .generated_at
                    .is_some_and(|at| now.signed_duration_since(at) < window)
        });

        let evicted = before - jobs.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = jobs.len(), "evicted settled jobs");
        }
    }

    /// Move a job one stage forward; returns the new status
    fn advance(&self, blueprint_id: &BlueprintId, started: Instant) -> Option<JobStatus> {
        let mut jobs = self.jobs().ok()?;
        let entry = jobs.get_mut(blueprint_id)?;
        let from = entry.record.status;
        if from.is_terminal() {
            return None;
        }

        if self.config.fail_at == Some(from) {
            entry.record.status = JobStatus::Failed;
            entry.record.error = Some(JobError {
                message: self.config.failure_message.clone(),
            });
        } else {
            let next = from
                .stage_index()
                .and_then(|i| JobStatus::PIPELINE.get(i + 1).copied())
                .unwrap_or(JobStatus::Succeeded);
            self.attach_stage_output(entry, next, started);
            entry.record.status = next;
        }

        let to = entry.record.status;
        log_transition!(from.as_str(), to.as_str(), blueprint_id = %blueprint_id);
        // No receivers is fine: nobody is watching this job
        let _ = entry.updates.send(entry.record.clone());
        Some(to)
    }

    fn attach_stage_output(&self, entry: &mut JobEntry, stage: JobStatus, started: Instant) {
        let base_url = self.config.download_base_url.trim_end_matches('/');
        let payload_checksum = entry
            .record
            .payload
            .as_ref()
            .and_then(|p| p.checksum_sha256.clone())
            .unwrap_or_default();

        let base_path = entry.base_path.clone();
        let file = |name: &str, bytes: u64| {
            let storage_path = format!("{}/{}", base_path, name);
            BlueprintFile {
                download_url: Some(format!("{}/{}", base_url, storage_path)),
                checksum_sha256: Some(checksum(
                    format!("{}:{}", payload_checksum, name).as_bytes(),
                )),
                bytes: Some(bytes),
                storage_path,
            }
        };

        match stage {
            JobStatus::Rendered => {
                entry.record.pdf = Some(file("blueprint.pdf", 482_113));
            }
            JobStatus::Bundled => {
                entry.record.artifact_bundle = Some(file("artifacts.zip", 1_204_992));
            }
            JobStatus::Succeeded => {
                if let Some(analytics) = entry.record.analytics.as_mut() {
                    analytics.delivery_latency_ms = Some(started.elapsed().as_millis() as u64);
                    analytics.last_exported_at = Some(Utc::now());
                }
            }
            _ => {}
        }
    }
}

fn ticket_for(record: &BlueprintJob) -> GenerationTicket {
    GenerationTicket {
        blueprint_id: record.id.clone(),
        status: record.status,
        payload_path: record
            .payload
            .as_ref()
            .and_then(|p| p.storage_path.clone())
            .unwrap_or_default(),
    }
}

/// Walk a job through its stages, one per configured delay
async fn progress(inner: Arc<Inner>, blueprint_id: BlueprintId) {
    let delay = inner.config.stage_delay();
    let started = Instant::now();
    loop {
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
        match inner.advance(&blueprint_id, started) {
            Some(status) if !status.is_terminal() => continue,
            _ => break,
        }
    }
}

#[async_trait]
impl GenerationRequester for SimulatedBlueprintService {
    async fn request_generation(&self, request: &GenerationRequest) -> Result<GenerationTicket> {
        self.inner.requests.fetch_add(1, Ordering::SeqCst);
        log_op_start!("sim_request_generation", engagement_id = %request.engagement_id);
        let started = Instant::now();

        let latency = self.inner.config.request_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let result = self.inner.create_or_reuse(request);
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(ticket) => {
                log_op_end!(
                    "sim_request_generation",
                    duration_ms = duration_ms,
                    blueprint_id = %ticket.blueprint_id
                );
            }
            Err(err) => {
                log_op_error!(
                    "sim_request_generation",
                    err.clone(),
                    duration_ms = duration_ms,
                    engagement_id = %request.engagement_id
                );
            }
        }
        result
    }
}

impl StatusSubscriber for SimulatedBlueprintService {
    fn subscribe(&self, blueprint_id: &BlueprintId, on_update: UpdateCallback) -> Subscription {
        let gate = SubscriptionGate::new();

        // Snapshot and receiver are taken under the same lock as stage updates
        let watched = self.inner.watch_job(blueprint_id);

        let delivery = gate.clone();
        let inner = self.inner.clone();
        let blueprint_id = blueprint_id.clone();
        let task = self.inner.runtime.spawn(async move {
            let Some((current, mut receiver)) = watched else {
                tracing::debug!(blueprint_id = %blueprint_id, "subscription to unknown job");
                delivery.deliver(|| on_update(None));
                return;
            };

            let mut terminal = current.status.is_terminal();
            if !delivery.deliver(|| on_update(Some(current))) {
                return;
            }

            while !terminal {
                let next = match receiver.recv().await {
                    Ok(job) => job,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(blueprint_id = %blueprint_id, skipped, "subscriber lagged");
                        // Jump to the latest record; queued older frames are dropped
                        match inner.watch_job(&blueprint_id) {
                            Some((latest, fresh)) => {
                                receiver = fresh;
                                latest
                            }
                            None => break,
                        }
                    }
                    Err(RecvError::Closed) => break,
                };
                terminal = next.status.is_terminal();
                if !delivery.deliver(|| on_update(Some(next))) {
                    return;
                }
            }
        });

        Subscription::new(gate, move || task.abort())
    }
}
