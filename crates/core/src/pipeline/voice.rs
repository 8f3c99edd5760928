//! Voice synthesis stage.

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{error, info};

use super::stage::{Stage, StageContext};
use super::state::{RunState, StageOutcome};
use crate::artifacts::ArtifactKind;
use crate::content::clean_narration_text;
use crate::providers::SpeechRequest;
use crate::run::{RunField, RunStatus};

pub const VOICE_FAILED: &str = "voice generation failed";

pub struct VoiceStage;

#[async_trait]
impl Stage for VoiceStage {
    fn name(&self) -> &'static str {
        "voice"
    }

    async fn run(&self, state: &mut RunState, ctx: &StageContext) -> StageOutcome {
        if let Some(voice) = ctx.artifacts.lookup(&state.run_id, ArtifactKind::Voice).await {
            info!("Run {} reuses voice track {}", state.run_id, voice.url);
            ctx.persist(state, RunField::VoiceUrl(voice.url.clone()));
            state.voice = Some(voice);
            ctx.report(state, RunStatus::Voice, 60);
            return StageOutcome::Resumed;
        }

        ctx.report(state, RunStatus::Voice, 45);

        let script = state
            .draft
            .as_ref()
            .map(|d| d.script.as_str())
            .unwrap_or(state.topic.as_str());
        let target = ctx.artifacts.target(&state.run_id, ArtifactKind::Voice);
        let request = SpeechRequest {
            text: clean_narration_text(script),
            output: target.path.clone(),
        };

        let request = &request;
        if let Err(e) = ctx
            .providers
            .speech
            .run(|p| async move { p.synthesize(request).await }.boxed())
            .await
        {
            error!("Run {} has no voice track: {}", state.run_id, e);
            ctx.artifacts.invalidate(&state.run_id, ArtifactKind::Voice).await;
            return StageOutcome::Fatal(VOICE_FAILED.to_string());
        }

        ctx.artifacts.record(target.clone()).await;
        ctx.persist(state, RunField::VoiceUrl(target.url.clone()));
        state.voice = Some(target);
        ctx.report(state, RunStatus::Voice, 60);
        StageOutcome::Completed
    }
}
