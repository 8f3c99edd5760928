//! Script analysis stage.

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{info, warn};

use super::stage::{Stage, StageContext};
use super::state::{RunState, StageOutcome};
use crate::content::ScriptAnalysis;
use crate::providers::AnalysisRequest;
use crate::run::{RunField, RunStatus};

pub struct AnalysisStage;

#[async_trait]
impl Stage for AnalysisStage {
    fn name(&self) -> &'static str {
        "analysis"
    }

    async fn run(&self, state: &mut RunState, ctx: &StageContext) -> StageOutcome {
        if state.analysis.is_some() {
            info!("Run {} reuses its stored analysis", state.run_id);
            ctx.report(state, RunStatus::Analyzing, 20);
            return StageOutcome::Resumed;
        }

        ctx.report(state, RunStatus::Analyzing, 15);

        let request = AnalysisRequest {
            context: state.creative_context(),
            tone: state.tone.clone(),
            platform: state.platform.clone(),
        };
        let request = &request;
        let analysis = match ctx
            .providers
            .analyzer
            .run(|p| async move { p.analyze(request).await }.boxed())
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Run {} falls back to the default analysis: {}", state.run_id, e);
                ScriptAnalysis::default()
            }
        };

        ctx.persist(state, RunField::Analysis(analysis.clone()));
        state.analysis = Some(analysis);
        ctx.report(state, RunStatus::Analyzing, 20);
        StageOutcome::Completed
    }
}
