#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use blueprint_core::model::{BlueprintJob, JobStatus};
use blueprint_core::service::UpdateCallback;
use blueprint_sim::{EngagementCatalog, SimulatedBlueprintService, SimulationConfig};

/// Collects every snapshot delivered to a subscription
#[derive(Clone, Default)]
pub struct Recorder {
    frames: Arc<Mutex<Vec<Option<BlueprintJob>>>>,
}

impl Recorder {
    pub fn callback(&self) -> UpdateCallback {
        let frames = self.frames.clone();
        Arc::new(move |snapshot| frames.lock().unwrap().push(snapshot))
    }

    pub fn frames(&self) -> Vec<Option<BlueprintJob>> {
        self.frames.lock().unwrap().clone()
    }

    /// Statuses of the non-empty frames, in delivery order
    pub fn statuses(&self) -> Vec<JobStatus> {
        self.frames()
            .into_iter()
            .flatten()
            .map(|job| job.status)
            .collect()
    }

    pub fn last(&self) -> Option<BlueprintJob> {
        self.frames().into_iter().flatten().last()
    }
}

/// Stages one second apart, no request latency
pub fn stepped() -> SimulationConfig {
    SimulationConfig {
        request_latency_ms: 0,
        stage_delay_ms: 1_000,
        ..SimulationConfig::default()
    }
}

pub fn service(config: SimulationConfig) -> SimulatedBlueprintService {
    SimulatedBlueprintService::new(config, EngagementCatalog::demo()).unwrap()
}

/// Long enough for every stage of a `stepped` job
pub async fn run_pipeline() {
    tokio::time::sleep(Duration::from_millis(5_500)).await;
}
