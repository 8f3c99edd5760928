//! Still-to-clip animation.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::error::ProviderError;
use super::traits::{Provider, VideoRequest, VideoSynthesizer};
use crate::media::{MediaEngine, PanDirection, PanZoomSpec, RenderJob, RenderSpec};

const ZOOM_LEVELS: [f64; 3] = [1.10, 1.15, 1.20];

/// Deterministic camera motion for one scene of one run.
pub fn camera_motion(run_id: &str, scene_index: usize) -> (f64, PanDirection) {
    let digest = Sha256::digest(format!("{}:{}", run_id, scene_index).as_bytes());
    let zoom = ZOOM_LEVELS[digest[0] as usize % ZOOM_LEVELS.len()];
    let pan = PanDirection::ALL[digest[1] as usize % PanDirection::ALL.len()];
    (zoom, pan)
}

/// Animates stills with a slow zoom and drift rendered by the media engine.
pub struct PanZoomAnimator {
    engine: Arc<dyn MediaEngine>,
    fps: u32,
}

impl PanZoomAnimator {
    pub fn new(engine: Arc<dyn MediaEngine>, fps: u32) -> Self {
        Self { engine, fps }
    }

    fn build_job(&self, request: &VideoRequest) -> RenderJob {
        let (zoom_end, pan) = camera_motion(&request.run_id, request.scene_index);
        let (width, height) = request.aspect_ratio.clip_size();
        RenderJob {
            job_id: format!("{}-scene-{}", request.run_id, request.scene_index),
            output_path: request.output.clone(),
            spec: RenderSpec::PanZoom(PanZoomSpec {
                image_path: request.image.clone(),
                duration_secs: request.duration_secs,
                width,
                height,
                fps: self.fps,
                zoom_end,
                pan,
            }),
        }
    }
}

impl Provider for PanZoomAnimator {
    fn name(&self) -> &str {
        "pan_zoom"
    }
}

#[async_trait]
impl VideoSynthesizer for PanZoomAnimator {
    async fn animate(&self, request: &VideoRequest) -> Result<(), ProviderError> {
        self.engine
            .render(self.build_job(request))
            .await
            .map(|_| ())
            .map_err(|e| ProviderError::failed(self.name(), e))
    }
}
