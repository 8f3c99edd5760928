//! Mock media engine for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::{MediaEngine, MediaError, MediaInfo, RenderJob, RenderResult};

/// Mock implementation of the MediaEngine trait.
///
/// Renders write a small placeholder file to the output path and remember the
/// duration the job asked for, so later probes of that output return it. Probes
/// of anything else must be configured with [`MockMediaEngine::set_duration`].
///
/// # Example
///
/// ```rust,ignore
/// use reelsmith_core::testing::MockMediaEngine;
///
/// let media = MockMediaEngine::new();
/// media.set_duration("/assets/voice_r1.mp3", 10.0).await;
///
/// // ...run an assembly...
///
/// assert_eq!(media.duration_of("/assets/animated_r1.mp4").await, Some(10.0));
/// ```
#[derive(Debug)]
pub struct MockMediaEngine {
    /// Submitted render jobs, in order.
    jobs: Arc<RwLock<Vec<RenderJob>>>,
    /// Known durations by path.
    durations: Arc<RwLock<HashMap<PathBuf, f64>>>,
    /// Duration reported for paths with no known duration.
    default_duration: Arc<RwLock<Option<f64>>>,
    /// Render kinds that always fail.
    failing_kinds: Arc<RwLock<HashSet<String>>>,
    /// Input images whose pan-zoom render fails.
    failing_inputs: Arc<RwLock<HashSet<PathBuf>>>,
    /// If set, the next render will fail with this error.
    next_error: Arc<RwLock<Option<MediaError>>>,
}

impl Default for MockMediaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaEngine {
    /// Create a new mock media engine.
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            durations: Arc::new(RwLock::new(HashMap::new())),
            default_duration: Arc::new(RwLock::new(None)),
            failing_kinds: Arc::new(RwLock::new(HashSet::new())),
            failing_inputs: Arc::new(RwLock::new(HashSet::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the duration a probe of `path` reports.
    pub async fn set_duration(&self, path: impl AsRef<Path>, secs: f64) {
        self.durations
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), secs);
    }

    /// Report `secs` for any path without a known duration.
    pub async fn set_default_duration(&self, secs: f64) {
        *self.default_duration.write().await = Some(secs);
    }

    /// Duration known for a path, either configured or produced by a render.
    pub async fn duration_of(&self, path: impl AsRef<Path>) -> Option<f64> {
        self.durations.read().await.get(path.as_ref()).copied()
    }

    /// Make every render of the given kind ("pan_zoom", "concat", "mix") fail.
    pub async fn fail_render_kind(&self, kind: &str) {
        self.failing_kinds.write().await.insert(kind.to_string());
    }

    /// Make pan-zoom renders of this input image fail.
    pub async fn fail_input(&self, path: impl AsRef<Path>) {
        self.failing_inputs
            .write()
            .await
            .insert(path.as_ref().to_path_buf());
    }

    /// Forget every configured render failure.
    pub async fn clear_failures(&self) {
        self.failing_kinds.write().await.clear();
        self.failing_inputs.write().await.clear();
        *self.next_error.write().await = None;
    }

    /// Configure the next render to fail with the given error.
    pub async fn set_next_error(&self, error: MediaError) {
        *self.next_error.write().await = Some(error);
    }

    /// All submitted render jobs.
    pub async fn rendered_jobs(&self) -> Vec<RenderJob> {
        self.jobs.read().await.clone()
    }

    /// Number of submitted jobs of one kind.
    pub async fn render_count(&self, kind: &str) -> usize {
        self.jobs
            .read()
            .await
            .iter()
            .filter(|job| job.spec.kind() == kind)
            .count()
    }

    async fn take_error(&self) -> Option<MediaError> {
        self.next_error.write().await.take()
    }

    async fn should_fail(&self, job: &RenderJob) -> bool {
        if self.failing_kinds.read().await.contains(job.spec.kind()) {
            return true;
        }
        match &job.spec {
            crate::media::RenderSpec::PanZoom(spec) => {
                self.failing_inputs.read().await.contains(&spec.image_path)
            }
            _ => false,
        }
    }
}

#[async_trait]
impl MediaEngine for MockMediaEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError> {
        let known = self.durations.read().await.get(path).copied();
        let duration = known
            .or(*self.default_duration.read().await)
            .ok_or_else(|| {
                MediaError::probe_failed(format!("no duration for {}", path.display()))
            })?;

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 1024,
            duration_secs: duration,
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
            audio_codec: None,
            video_codec: None,
            video_width: None,
            video_height: None,
            video_fps: None,
        })
    }

    async fn render(&self, job: RenderJob) -> Result<RenderResult, MediaError> {
        self.jobs.write().await.push(job.clone());

        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if self.should_fail(&job).await {
            return Err(MediaError::render_failed(
                format!("mock {} render failed", job.spec.kind()),
                None,
            ));
        }

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&job.output_path, b"mock-render").await?;
        self.set_duration(&job.output_path, job.spec.expected_duration())
            .await;

        Ok(RenderResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: 11,
            elapsed_ms: 1,
        })
    }

    async fn validate(&self) -> Result<(), MediaError> {
        Ok(())
    }
}
