//! Multi-scene animation and final assembly.

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::stage::{Stage, StageContext};
use super::state::{RunState, StageOutcome};
use crate::artifacts::{ArtifactHandle, ArtifactKind};
use crate::assembly::{AssemblyClip, AssemblyRequest};
use crate::content::{desensitize_prompt, styled_scene_prompt, ContentDraft, Scene};
use crate::metrics::SCENES_DROPPED;
use crate::providers::{ImageRequest, MusicRequest, VideoRequest};
use crate::run::{RunField, RunStatus};

pub const SCENES_FAILED: &str = "multi-scene generation failed completely";
pub const ASSEMBLY_FAILED: &str = "multi-scene video assembly failed";

const SCENES_START: u8 = 65;
const SCENES_SPAN: u8 = 20;

/// Progress after `done` of `total` scenes, spread over 65..=85.
pub fn scene_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return SCENES_START;
    }
    SCENES_START + (SCENES_SPAN as usize * done.min(total) / total) as u8
}

pub struct AnimationStage;

impl AnimationStage {
    /// Rewrite the prompt through the sanitizer chain, keeping it as is on failure.
    async fn sanitized(&self, ctx: &StageContext, prompt: String) -> String {
        let Some(chain) = &ctx.providers.sanitizer else {
            return prompt;
        };
        let result = {
            let original = prompt.as_str();
            chain
                .run(|p| async move { p.sanitize(original).await }.boxed())
                .await
        };
        match result {
            Ok(rewritten) => rewritten,
            Err(e) => {
                debug!("Using unsanitized prompt: {}", e);
                prompt
            }
        }
    }

    async fn scene_image(
        &self,
        state: &RunState,
        ctx: &StageContext,
        draft: &ContentDraft,
        index: usize,
        scene: &Scene,
    ) -> Option<ArtifactHandle> {
        let kind = ArtifactKind::SceneImage(index);
        if let Some(image) = ctx.artifacts.lookup(&state.run_id, kind).await {
            debug!("Run {} reuses image for scene {}", state.run_id, index);
            return Some(image);
        }

        let prompt = self
            .sanitized(ctx, styled_scene_prompt(&scene.prompt, &draft.visual_style))
            .await;
        let target = ctx.artifacts.target(&state.run_id, kind);
        let mut request = ImageRequest {
            prompt,
            aspect_ratio: scene.aspect_ratio,
            output: target.path.clone(),
        };

        let mut result = {
            let request = &request;
            ctx.providers
                .image
                .run(|p| async move { p.generate(request).await }.boxed())
                .await
        };

        // One softer retry when a generator refused the prompt.
        if let Err(e) = &result {
            if e.policy_violation {
                info!("Scene {} of run {} refused, retrying desensitized", index, state.run_id);
                request.prompt = desensitize_prompt(&request.prompt);
                let request = &request;
                result = ctx
                    .providers
                    .image
                    .run(|p| async move { p.generate(request).await }.boxed())
                    .await;
            }
        }

        match result {
            Ok(()) => {
                ctx.artifacts.record(target.clone()).await;
                Some(target)
            }
            Err(e) => {
                warn!("Dropping scene {} of run {}: {}", index, state.run_id, e);
                SCENES_DROPPED.with_label_values(&["image"]).inc();
                ctx.artifacts.invalidate(&state.run_id, kind).await;
                None
            }
        }
    }

    async fn scene_clip(
        &self,
        state: &RunState,
        ctx: &StageContext,
        draft: &ContentDraft,
        index: usize,
        scene: &Scene,
    ) -> Option<ArtifactHandle> {
        let kind = ArtifactKind::SceneClip(index);
        if let Some(clip) = ctx.artifacts.lookup(&state.run_id, kind).await {
            debug!("Run {} reuses clip for scene {}", state.run_id, index);
            return Some(clip);
        }

        let image = self.scene_image(state, ctx, draft, index, scene).await?;
        let target = ctx.artifacts.target(&state.run_id, kind);
        let request = VideoRequest {
            run_id: state.run_id.clone(),
            scene_index: index,
            image: image.path,
            duration_secs: scene.duration_secs,
            aspect_ratio: scene.aspect_ratio,
            output: target.path.clone(),
        };

        let request = &request;
        match ctx
            .providers
            .video
            .run(|p| async move { p.animate(request).await }.boxed())
            .await
        {
            Ok(()) => {
                ctx.artifacts.record(target.clone()).await;
                Some(target)
            }
            Err(e) => {
                warn!("Dropping scene {} of run {}: {}", index, state.run_id, e);
                SCENES_DROPPED.with_label_values(&["animation"]).inc();
                ctx.artifacts.invalidate(&state.run_id, kind).await;
                None
            }
        }
    }

    /// Background music. Failures only mean the video has no music bed.
    async fn music(
        &self,
        state: &RunState,
        ctx: &StageContext,
        draft: &ContentDraft,
    ) -> Option<ArtifactHandle> {
        if let Some(music) = ctx.artifacts.lookup(&state.run_id, ArtifactKind::Music).await {
            return Some(music);
        }

        let target = ctx.artifacts.target(&state.run_id, ArtifactKind::Music);
        let request = MusicRequest {
            run_id: state.run_id.clone(),
            prompt: format!("Background music: {}", draft.music_mood),
            duration_secs: draft.total_scene_duration(),
            generative_cap_secs: ctx.config.generative_music_cap_secs,
            output: target.path.clone(),
        };

        let request = &request;
        match ctx
            .providers
            .music
            .run(|p| async move { p.compose(request).await }.boxed())
            .await
        {
            Ok(()) => {
                ctx.artifacts.record(target.clone()).await;
                Some(target)
            }
            Err(e) => {
                warn!("Run {} continues without music: {}", state.run_id, e);
                ctx.artifacts.invalidate(&state.run_id, ArtifactKind::Music).await;
                None
            }
        }
    }
}

#[async_trait]
impl Stage for AnimationStage {
    fn name(&self) -> &'static str {
        "animation"
    }

    async fn run(&self, state: &mut RunState, ctx: &StageContext) -> StageOutcome {
        ctx.report(state, RunStatus::Animation, SCENES_START);

        let draft = state
            .draft
            .clone()
            .unwrap_or_else(ContentDraft::error_placeholder);
        let scenes = draft.effective_scenes();
        info!("Run {} animating {} scenes", state.run_id, scenes.len());

        let mut clips = Vec::with_capacity(scenes.len());
        state.scene_clips.clear();
        for (index, scene) in scenes.iter().enumerate() {
            if let Some(clip) = self.scene_clip(state, ctx, &draft, index, scene).await {
                clips.push(AssemblyClip {
                    path: clip.path.clone(),
                    planned_duration: scene.duration_secs,
                    aspect_ratio: scene.aspect_ratio,
                });
                state.scene_clips.push(clip);
            }
            ctx.report(state, RunStatus::Animation, scene_progress(index + 1, scenes.len()));
        }

        if clips.is_empty() {
            error!("Run {}: every scene failed", state.run_id);
            return StageOutcome::Fatal(SCENES_FAILED.to_string());
        }

        let music = self.music(state, ctx, &draft).await;
        if let Some(music) = &music {
            ctx.persist(state, RunField::MusicUrl(music.url.clone()));
        }
        state.music = music;

        ctx.report(state, RunStatus::Animation, 90);

        let voice = match &state.voice {
            Some(voice) => voice.clone(),
            None => match ctx.artifacts.lookup(&state.run_id, ArtifactKind::Voice).await {
                Some(voice) => voice,
                None => {
                    error!("Run {} reached assembly without a voice track", state.run_id);
                    return StageOutcome::Fatal(ASSEMBLY_FAILED.to_string());
                }
            },
        };

        let output = ctx.artifacts.target(&state.run_id, ArtifactKind::FinalVideo);
        let request = AssemblyRequest {
            run_id: state.run_id.clone(),
            clips,
            voice_path: voice.path.clone(),
            music_path: state.music.as_ref().map(|m| m.path.clone()),
            sequence_path: ctx
                .artifacts
                .target(&state.run_id, ArtifactKind::Sequence)
                .path,
            output_path: output.path.clone(),
        };

        match ctx.assembler.assemble(&request).await {
            Ok(video) => {
                info!(
                    "Run {} assembled {:.2}s video at {}",
                    state.run_id,
                    video.plan.output_duration(),
                    output.url
                );
                ctx.artifacts.record(output.clone()).await;
                ctx.persist(state, RunField::VideoUrl(output.url.clone()));
                state.final_video = Some(output);
                ctx.report(state, RunStatus::PendingApproval, 100);
                StageOutcome::Completed
            }
            Err(e) => {
                error!("Run {} assembly failed: {}", state.run_id, e);
                ctx.artifacts
                    .invalidate(&state.run_id, ArtifactKind::FinalVideo)
                    .await;
                StageOutcome::Fatal(ASSEMBLY_FAILED.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_progress_spans_65_to_85() {
        assert_eq!(scene_progress(0, 4), 65);
        assert_eq!(scene_progress(1, 4), 70);
        assert_eq!(scene_progress(4, 4), 85);
        assert_eq!(scene_progress(1, 3), 71);
        assert_eq!(scene_progress(9, 3), 85);
        assert_eq!(scene_progress(0, 0), 65);
    }

    #[test]
    fn test_scene_progress_is_monotonic() {
        let values: Vec<u8> = (0..=7).map(|i| scene_progress(i, 7)).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }
}
