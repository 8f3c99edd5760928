use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::plan::{AssemblyPlan, AssemblySettings};
use crate::content::AspectRatio;
use crate::media::{
    ConcatSpec, MediaEngine, MediaError, MixSpec, MusicBed, RenderJob, RenderResult, RenderSpec,
};

/// Errors from multi-scene assembly.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("No clips to assemble")]
    NoClips,

    #[error("Voice track has no usable duration: {0}")]
    Voice(MediaError),

    #[error("Concatenation failed: {0}")]
    Concat(MediaError),

    #[error("Final mix failed: {0}")]
    Mix(MediaError),
}

/// One rendered scene clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyClip {
    pub path: PathBuf,
    /// Duration the scene was rendered for, used when probing fails.
    pub planned_duration: f64,
    pub aspect_ratio: AspectRatio,
}

/// Everything one assembly reads and writes.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    pub run_id: String,
    pub clips: Vec<AssemblyClip>,
    pub voice_path: PathBuf,
    pub music_path: Option<PathBuf>,
    /// Intermediate joined sequence.
    pub sequence_path: PathBuf,
    pub output_path: PathBuf,
}

/// Result of a successful assembly.
#[derive(Debug, Clone)]
pub struct AssembledVideo {
    pub plan: AssemblyPlan,
    pub output: RenderResult,
}

/// Joins scene clips, loops or trims them to the voice, and mixes the audio.
pub struct MultiSceneAssembler {
    media: Arc<dyn MediaEngine>,
    settings: AssemblySettings,
}

impl MultiSceneAssembler {
    pub fn new(media: Arc<dyn MediaEngine>, settings: AssemblySettings) -> Self {
        Self { media, settings }
    }

    pub fn settings(&self) -> &AssemblySettings {
        &self.settings
    }

    /// Measure clip and voice durations, then build the plan.
    pub async fn plan(&self, request: &AssemblyRequest) -> Result<AssemblyPlan, AssemblyError> {
        let first = request.clips.first().ok_or(AssemblyError::NoClips)?;

        let mut durations = Vec::with_capacity(request.clips.len());
        for clip in &request.clips {
            let duration = match self.media.duration(&clip.path).await {
                Ok(d) => d,
                Err(e) => {
                    warn!(
                        "Could not probe {}, using planned {}s: {}",
                        clip.path.display(),
                        clip.planned_duration,
                        e
                    );
                    clip.planned_duration
                }
            };
            durations.push(duration);
        }

        let voice_duration = self
            .media
            .duration(&request.voice_path)
            .await
            .map_err(AssemblyError::Voice)?;

        AssemblyPlan::compute(durations, voice_duration, first.aspect_ratio, &self.settings)
            .ok_or(AssemblyError::NoClips)
    }

    /// Render the joined sequence and the final mix.
    pub async fn assemble(
        &self,
        request: &AssemblyRequest,
    ) -> Result<AssembledVideo, AssemblyError> {
        let plan = self.plan(request).await?;
        info!(
            "Assembling run {}: {} clips, sequence {:.2}s x{} for voice {:.2}s at {}x{}",
            request.run_id,
            plan.clip_durations.len(),
            plan.concat_duration,
            plan.loops,
            plan.voice_duration,
            plan.width,
            plan.height
        );

        let concat = RenderJob {
            job_id: format!("{}-concat", request.run_id),
            output_path: request.sequence_path.clone(),
            spec: RenderSpec::Concat(ConcatSpec {
                clips: request.clips.iter().map(|c| c.path.clone()).collect(),
                clip_durations: plan.clip_durations.clone(),
                crossfade_secs: plan.crossfade_secs,
                width: plan.width,
                height: plan.height,
                fps: plan.fps,
            }),
        };
        let sequence = self.media.render(concat).await.map_err(AssemblyError::Concat)?;
        debug!(
            "Sequence for run {} rendered in {}ms",
            request.run_id, sequence.elapsed_ms
        );

        let mix = RenderJob {
            job_id: format!("{}-mix", request.run_id),
            output_path: request.output_path.clone(),
            spec: RenderSpec::Mix(MixSpec {
                video_path: sequence.output_path,
                video_loops: plan.loops,
                voice_path: request.voice_path.clone(),
                music: request.music_path.clone().map(|path| MusicBed {
                    path,
                    volume: self.settings.music_volume,
                }),
                duration_secs: plan.output_duration(),
                fps: plan.fps,
            }),
        };
        let output = self.media.render(mix).await.map_err(AssemblyError::Mix)?;

        Ok(AssembledVideo { plan, output })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockMediaEngine;

    fn request(dir: &std::path::Path, clips: usize) -> AssemblyRequest {
        AssemblyRequest {
            run_id: "r1".to_string(),
            clips: (0..clips)
                .map(|i| AssemblyClip {
                    path: dir.join(format!("scene_raw_r1_{}.mp4", i)),
                    planned_duration: 5.0,
                    aspect_ratio: AspectRatio::Portrait,
                })
                .collect(),
            voice_path: dir.join("voice_r1.mp3"),
            music_path: Some(dir.join("music_r1.mp3")),
            sequence_path: dir.join("sequence_r1.mp4"),
            output_path: dir.join("animated_r1.mp4"),
        }
    }

    #[tokio::test]
    async fn test_assemble_loops_short_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(MockMediaEngine::new());
        let req = request(dir.path(), 1);
        media.set_duration(&req.clips[0].path, 4.0).await;
        media.set_duration(&req.voice_path, 10.0).await;

        let assembler = MultiSceneAssembler::new(media.clone(), AssemblySettings::default());
        let video = assembler.assemble(&req).await.unwrap();

        assert_eq!(video.plan.loops, 3);
        assert_eq!(media.duration_of(&req.output_path).await, Some(10.0));

        let jobs = media.rendered_jobs().await;
        assert_eq!(jobs.len(), 2);
        match &jobs[1].spec {
            RenderSpec::Mix(mix) => {
                assert_eq!(mix.video_loops, 3);
                assert_eq!(mix.duration_secs, 10.0);
                assert_eq!(mix.music.as_ref().unwrap().volume, 0.15);
            }
            other => panic!("expected mix, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_assemble_trims_long_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(MockMediaEngine::new());
        let req = request(dir.path(), 2);
        media.set_duration(&req.clips[0].path, 5.0).await;
        media.set_duration(&req.clips[1].path, 5.5).await;
        media.set_duration(&req.voice_path, 4.0).await;

        let assembler = MultiSceneAssembler::new(media.clone(), AssemblySettings::default());
        let video = assembler.assemble(&req).await.unwrap();

        assert_eq!(video.plan.loops, 1);
        assert_eq!(media.duration_of(&req.output_path).await, Some(4.0));
    }

    #[tokio::test]
    async fn test_unprobeable_clip_uses_planned_duration() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(MockMediaEngine::new());
        let req = request(dir.path(), 1);
        media.set_duration(&req.voice_path, 12.0).await;

        let assembler = MultiSceneAssembler::new(media, AssemblySettings::default());
        let plan = assembler.plan(&req).await.unwrap();
        assert_eq!(plan.clip_durations, vec![5.0]);
        assert_eq!(plan.loops, 3);
    }

    #[tokio::test]
    async fn test_failed_mix_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(MockMediaEngine::new());
        let req = request(dir.path(), 1);
        media.set_duration(&req.clips[0].path, 5.0).await;
        media.set_duration(&req.voice_path, 5.0).await;
        media.fail_render_kind("mix").await;

        let assembler = MultiSceneAssembler::new(media, AssemblySettings::default());
        let err = assembler.assemble(&req).await.unwrap_err();
        assert!(matches!(err, AssemblyError::Mix(_)));
    }

    #[tokio::test]
    async fn test_no_clips() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(MockMediaEngine::new());
        let assembler = MultiSceneAssembler::new(media, AssemblySettings::default());
        let err = assembler.assemble(&request(dir.path(), 0)).await.unwrap_err();
        assert!(matches!(err, AssemblyError::NoClips));
    }
}
