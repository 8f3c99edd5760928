//! Capability traits implemented by generation back ends.

use async_trait::async_trait;
use std::path::PathBuf;

use super::error::ProviderError;
use crate::content::{AspectRatio, ContentDraft, ScriptAnalysis, TrendCandidate};

/// Common base of every provider.
pub trait Provider: Send + Sync {
    /// Short name used in logs, metrics and exhaustion reports.
    fn name(&self) -> &str;
}

/// Input for script analysis.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Selected trend rendered as text, or the bare topic.
    pub context: String,
    pub tone: String,
    pub platform: String,
}

/// Input for drafting.
#[derive(Debug, Clone)]
pub struct DraftRequest {
    pub context: String,
    pub analysis: ScriptAnalysis,
    pub tone: String,
    pub duration_secs: u32,
    pub platform: String,
}

/// Narration to synthesize into `output`.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub output: PathBuf,
}

/// Still image to generate into `output`.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub output: PathBuf,
}

/// Animate `image` into a clip at `output`.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub run_id: String,
    pub scene_index: usize,
    pub image: PathBuf,
    pub duration_secs: f64,
    pub aspect_ratio: AspectRatio,
    pub output: PathBuf,
}

/// Background music to produce into `output`.
#[derive(Debug, Clone)]
pub struct MusicRequest {
    pub run_id: String,
    pub prompt: String,
    /// Desired length, normally the sum of the scene durations.
    pub duration_secs: f64,
    /// Upper bound for providers that synthesize audio.
    pub generative_cap_secs: f64,
    pub output: PathBuf,
}

impl MusicRequest {
    /// Length a generative provider should ask for.
    pub fn generative_duration(&self) -> f64 {
        self.duration_secs.min(self.generative_cap_secs)
    }
}

#[async_trait]
pub trait ScriptAnalyzer: Provider {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<ScriptAnalysis, ProviderError>;
}

#[async_trait]
pub trait ContentDrafter: Provider {
    async fn draft(&self, request: &DraftRequest) -> Result<ContentDraft, ProviderError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Provider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait ImageSynthesizer: Provider {
    async fn generate(&self, request: &ImageRequest) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait VideoSynthesizer: Provider {
    async fn animate(&self, request: &VideoRequest) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait MusicSynthesizer: Provider {
    async fn compose(&self, request: &MusicRequest) -> Result<(), ProviderError>;
}

/// Rewrites an image prompt so generators are less likely to refuse it.
#[async_trait]
pub trait PromptSanitizer: Provider {
    async fn sanitize(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Best-effort source of trending content for a topic.
#[async_trait]
pub trait TrendSource: Provider {
    async fn discover(&self, topic: &str) -> Result<Vec<TrendCandidate>, ProviderError>;
}
