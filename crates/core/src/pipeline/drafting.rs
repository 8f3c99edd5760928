//! Content drafting stage.

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{info, warn};

use super::stage::{Stage, StageContext};
use super::state::{RunState, StageOutcome};
use crate::content::ContentDraft;
use crate::providers::DraftRequest;
use crate::run::{RunField, RunStatus};

pub struct DraftingStage;

#[async_trait]
impl Stage for DraftingStage {
    fn name(&self) -> &'static str {
        "drafting"
    }

    async fn run(&self, state: &mut RunState, ctx: &StageContext) -> StageOutcome {
        match &state.draft {
            Some(draft) if draft.has_scenes() => {
                info!("Run {} reuses its stored draft", state.run_id);
                ctx.report(state, RunStatus::Generating, 40);
                return StageOutcome::Resumed;
            }
            Some(_) => info!("Run {} has a draft without scenes, redrafting", state.run_id),
            None => {}
        }

        ctx.report(state, RunStatus::Generating, 25);

        let request = DraftRequest {
            context: state.creative_context(),
            analysis: state.analysis.clone().unwrap_or_default(),
            tone: state.tone.clone(),
            duration_secs: state.duration_secs,
            platform: state.platform.clone(),
        };
        let request = &request;
        let draft = match ctx
            .providers
            .drafter
            .run(|p| async move { p.draft(request).await }.boxed())
            .await
        {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Run {} falls back to the error draft: {}", state.run_id, e);
                ContentDraft::error_placeholder()
            }
        };

        info!(
            "Run {} drafted '{}' with {} scenes",
            state.run_id,
            draft.title,
            draft.scenes.len()
        );
        ctx.persist(state, RunField::Draft(draft.clone()));
        state.draft = Some(draft);
        ctx.report(state, RunStatus::Generating, 40);
        StageOutcome::Completed
    }
}
