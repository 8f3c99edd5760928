//! Run orchestrator: the service facade over the store and the engine.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::config::OrchestratorConfig;
use super::publisher::Publisher;
use super::types::{OrchestratorError, OrchestratorStatus, StartRunRequest};
use crate::metrics::RUNS_PUBLISHED;
use crate::pipeline::PipelineEngine;
use crate::run::{ApprovalAction, CreateRunRequest, RunFilter, RunRecord, RunStatus, RunStore};

/// Engine task currently executing for a topic.
#[derive(Debug)]
struct ActiveRun {
    run_id: String,
    /// The topic was submitted again while this attempt was executing.
    resubmitted: bool,
}

/// Starts, resumes, reviews and deletes runs.
///
/// Engine executions are spawned onto the runtime; calls return as soon as the
/// run is stored. Each topic has at most one executing engine within this
/// process. A resubmission while it executes is absorbed: if that attempt ends
/// in ERROR the same task resumes the run once more.
pub struct RunOrchestrator {
    config: OrchestratorConfig,
    store: Arc<dyn RunStore>,
    engine: Arc<PipelineEngine>,
    publisher: Arc<dyn Publisher>,
    active: Arc<Mutex<HashMap<String, ActiveRun>>>,
}

impl RunOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        store: Arc<dyn RunStore>,
        engine: Arc<PipelineEngine>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            store,
            engine,
            publisher,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Start a run for a topic, resuming its latest failed run if there is one.
    pub async fn start(&self, request: StartRunRequest) -> Result<String, OrchestratorError> {
        request.validate()?;
        let topic = request.topic.trim().to_string();

        let mut active = self.active.lock().await;

        if let Some(running) = active.get_mut(&topic) {
            info!("Run {} for '{}' is already executing", running.run_id, topic);
            running.resubmitted = true;
            return Ok(running.run_id.clone());
        }

        let record = match self.store.find_latest_failed_by_topic(&topic)? {
            Some(failed) => {
                info!("Resuming run {} for '{}'", failed.id, topic);
                self.store.begin_attempt(&failed.id)?
            }
            None => self.store.create(CreateRunRequest {
                topic: topic.clone(),
                tone: request.tone,
                duration_secs: request.duration_secs,
                platform: request.platform,
                use_captions: request.use_captions,
            })?,
        };

        let run_id = record.id;
        active.insert(
            topic.clone(),
            ActiveRun {
                run_id: run_id.clone(),
                resubmitted: false,
            },
        );
        drop(active);

        self.spawn_engine(topic, run_id.clone());
        Ok(run_id)
    }

    fn spawn_engine(&self, topic: String, run_id: String) {
        let engine = Arc::clone(&self.engine);
        let store = Arc::clone(&self.store);
        let active = Arc::clone(&self.active);

        tokio::spawn(async move {
            loop {
                if let Err(e) = engine.execute(&run_id).await {
                    error!("Engine aborted run {}: {}", run_id, e);
                }

                let mut running = active.lock().await;
                let resubmitted = running
                    .get_mut(&topic)
                    .map(|entry| std::mem::take(&mut entry.resubmitted))
                    .unwrap_or(false);
                if resubmitted && Self::resume_failed(store.as_ref(), &run_id) {
                    continue;
                }
                running.remove(&topic);
                break;
            }
        });
    }

    /// Begin another attempt if the run ended in ERROR.
    fn resume_failed(store: &dyn RunStore, run_id: &str) -> bool {
        match store.get(run_id) {
            Ok(Some(record)) if record.status == RunStatus::Error => {
                match store.begin_attempt(run_id) {
                    Ok(_) => {
                        info!("Resuming run {} resubmitted while it executed", run_id);
                        true
                    }
                    Err(e) => {
                        warn!("Failed to resume run {}: {}", run_id, e);
                        false
                    }
                }
            }
            Ok(_) => false,
            Err(e) => {
                warn!("Failed to reload run {}: {}", run_id, e);
                false
            }
        }
    }

    pub fn get(&self, run_id: &str) -> Result<Option<RunRecord>, OrchestratorError> {
        Ok(self.store.get(run_id)?)
    }

    /// Runs matching the filter, newest first.
    pub fn list(&self, filter: &RunFilter) -> Result<Vec<RunRecord>, OrchestratorError> {
        Ok(self.store.list(filter)?)
    }

    pub fn count(&self, filter: &RunFilter) -> Result<i64, OrchestratorError> {
        Ok(self.store.count(filter)?)
    }

    /// Approve or reject a run waiting for review.
    ///
    /// Approval hands the run to the publisher in the background.
    pub async fn approve(
        &self,
        run_id: &str,
        action: ApprovalAction,
    ) -> Result<RunRecord, OrchestratorError> {
        match action {
            ApprovalAction::Reject => {
                let record = self.store.transition(
                    run_id,
                    RunStatus::PendingApproval,
                    RunStatus::Rejected,
                    "reject",
                )?;
                info!("Run {} rejected", run_id);
                Ok(record)
            }
            ApprovalAction::Approve => {
                let record = self.store.transition(
                    run_id,
                    RunStatus::PendingApproval,
                    RunStatus::Approved,
                    "approve",
                )?;
                info!("Run {} approved, publishing via {}", run_id, self.publisher.name());
                self.spawn_publish(record.clone());
                Ok(record)
            }
        }
    }

    fn spawn_publish(&self, record: RunRecord) {
        let store = Arc::clone(&self.store);
        let publisher = Arc::clone(&self.publisher);

        tokio::spawn(async move {
            match publisher.publish(&record).await {
                Ok(()) => {
                    RUNS_PUBLISHED.with_label_values(&["success"]).inc();
                    if let Err(e) = store.transition(
                        &record.id,
                        RunStatus::Approved,
                        RunStatus::Published,
                        "publish",
                    ) {
                        warn!("Run {} published but not marked: {}", record.id, e);
                    }
                }
                Err(e) => {
                    RUNS_PUBLISHED.with_label_values(&["error"]).inc();
                    error!("Run {} failed to publish: {}", record.id, e);
                    if let Err(e) = store.fail(&record.id, &e.to_string()) {
                        warn!("Failed to record publish error for run {}: {}", record.id, e);
                    }
                }
            }
        });
    }

    /// Remove the record. Generated files stay on disk.
    pub fn delete(&self, run_id: &str) -> Result<RunRecord, OrchestratorError> {
        let record = self.store.delete(run_id)?;
        info!("Run {} deleted", run_id);
        Ok(record)
    }

    /// Whether an engine is executing this run right now.
    pub async fn is_active(&self, run_id: &str) -> bool {
        self.active
            .lock()
            .await
            .values()
            .any(|running| running.run_id == run_id)
    }

    pub async fn status(&self) -> OrchestratorStatus {
        let active_runs = self.active.lock().await.len();

        let mut runs_by_status = BTreeMap::new();
        for status in RunStatus::ALL {
            let count = self
                .store
                .count(&RunFilter::new().with_status(status))
                .unwrap_or(0);
            if count > 0 {
                runs_by_status.insert(status.as_str().to_string(), count);
            }
        }

        OrchestratorStatus {
            active_runs,
            runs_by_status,
        }
    }
}
