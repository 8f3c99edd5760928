//! Stage abstraction and the collaborators every stage can reach.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::config::EngineConfig;
use super::state::{RunState, StageOutcome};
use crate::artifacts::ArtifactIndex;
use crate::assembly::MultiSceneAssembler;
use crate::providers::ProviderSet;
use crate::run::{RunField, RunStatus, RunStore};

/// One step of the pipeline.
///
/// A stage checks whether its output already exists before calling any
/// provider, and reports failure only through [`StageOutcome::Fatal`].
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &mut RunState, ctx: &StageContext) -> StageOutcome;
}

/// Shared collaborators handed to each stage.
pub struct StageContext {
    pub config: EngineConfig,
    pub providers: ProviderSet,
    pub artifacts: Arc<ArtifactIndex>,
    pub assembler: MultiSceneAssembler,
    store: Arc<dyn RunStore>,
}

impl StageContext {
    pub fn new(
        config: EngineConfig,
        providers: ProviderSet,
        artifacts: Arc<ArtifactIndex>,
        assembler: MultiSceneAssembler,
        store: Arc<dyn RunStore>,
    ) -> Self {
        Self {
            config,
            providers,
            artifacts,
            assembler,
            store,
        }
    }

    /// Mirror status and progress to the run record.
    ///
    /// A failed write is logged and otherwise ignored; the stage keeps going.
    pub fn report(&self, state: &RunState, status: RunStatus, progress: u8) {
        debug!("Run {} at {} ({}%)", state.run_id, status, progress);
        if let Err(e) = self.store.update_progress(&state.run_id, status, progress) {
            warn!(
                "Failed to record progress {} for run {}: {}",
                progress, state.run_id, e
            );
        }
    }

    /// Persist one stage output to the run record.
    pub fn persist(&self, state: &RunState, field: RunField) {
        if let Err(e) = self.store.update_field(&state.run_id, field) {
            warn!("Failed to persist output of run {}: {}", state.run_id, e);
        }
    }
}
