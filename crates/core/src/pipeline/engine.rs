//! Runs the stages in order over one run.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{error, info};

use super::analysis::AnalysisStage;
use super::animation::AnimationStage;
use super::config::EngineConfig;
use super::discovery::DiscoveryStage;
use super::drafting::DraftingStage;
use super::stage::{Stage, StageContext};
use super::state::{RunState, StageOutcome};
use super::voice::VoiceStage;
use crate::artifacts::ArtifactIndex;
use crate::assembly::MultiSceneAssembler;
use crate::media::MediaEngine;
use crate::metrics::{RUNS_COMPLETED, RUNS_FAILED, RUNS_STARTED, STAGE_DURATION};
use crate::providers::ProviderSet;
use crate::run::{RunError, RunStore};

/// Errors that abort an engine invocation without a stage outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("run store error: {0}")]
    Store(#[from] RunError),
}

/// Executes discovery, analysis, drafting, voice and animation in that order.
///
/// The first `Fatal` outcome is written to the run record as `ERROR` and ends
/// the execution. Everything else a stage hits is absorbed inside the stage.
pub struct PipelineEngine {
    store: Arc<dyn RunStore>,
    ctx: StageContext,
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn RunStore>,
        providers: ProviderSet,
        artifacts: Arc<ArtifactIndex>,
        media: Arc<dyn MediaEngine>,
    ) -> Self {
        let assembler = MultiSceneAssembler::new(media, config.assembly_settings());
        let ctx = StageContext::new(config, providers, artifacts, assembler, Arc::clone(&store));
        Self {
            store,
            ctx,
            stages: vec![
                Box::new(DiscoveryStage),
                Box::new(AnalysisStage),
                Box::new(DraftingStage),
                Box::new(VoiceStage),
                Box::new(AnimationStage),
            ],
        }
    }

    pub fn artifacts(&self) -> &Arc<ArtifactIndex> {
        &self.ctx.artifacts
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Execute every stage against the stored run.
    ///
    /// Returns the final state, including when a stage ended the run with an
    /// error. `Err` means the run could not be loaded or failed to persist.
    pub async fn execute(&self, run_id: &str) -> Result<RunState, EngineError> {
        let record = self
            .store
            .get(run_id)?
            .ok_or_else(|| EngineError::RunNotFound(run_id.to_string()))?;

        RUNS_STARTED.inc();
        let mut state = RunState::from_record(&record);
        info!("Run {} started for topic '{}'", state.run_id, state.topic);

        for stage in &self.stages {
            let started = Instant::now();
            let outcome = stage.run(&mut state, &self.ctx).await;
            STAGE_DURATION
                .with_label_values(&[stage.name(), outcome.label()])
                .observe(started.elapsed().as_secs_f64());
            info!(
                "Run {} finished stage {} ({})",
                state.run_id,
                stage.name(),
                outcome.label()
            );

            if let StageOutcome::Fatal(message) = outcome {
                error!("Run {} failed in {}: {}", state.run_id, stage.name(), message);
                RUNS_FAILED.inc();
                self.store.fail(&state.run_id, &message)?;
                state.error = Some(message);
                return Ok(state);
            }
        }

        RUNS_COMPLETED.inc();
        info!(
            "Run {} ready for approval: {}",
            state.run_id,
            state.video_url().unwrap_or_default()
        );
        Ok(state)
    }
}
