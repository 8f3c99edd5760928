//! Trait definitions for the media module.

use async_trait::async_trait;
use std::path::Path;

use super::error::MediaError;
use super::types::{MediaInfo, RenderJob, RenderResult};

/// Something that can probe media files and execute render jobs.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError>;

    /// Executes a render job, writing the result to `job.output_path`.
    async fn render(&self, job: RenderJob) -> Result<RenderResult, MediaError>;

    /// Validates that the engine is properly configured and ready.
    async fn validate(&self) -> Result<(), MediaError>;

    /// Duration of a media file in seconds.
    async fn duration(&self, path: &Path) -> Result<f64, MediaError> {
        let info = self.probe(path).await?;
        if info.duration_secs > 0.0 {
            Ok(info.duration_secs)
        } else {
            Err(MediaError::probe_failed(format!(
                "{} reports no duration",
                path.display()
            )))
        }
    }
}
