//! Mock generation providers for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::content::{ContentDraft, ScriptAnalysis, TrendCandidate};
use crate::providers::{
    AnalysisRequest, ContentDrafter, DraftRequest, ImageRequest, ImageSynthesizer, MusicRequest,
    MusicSynthesizer, Provider, ProviderError, ScriptAnalyzer, SpeechRequest, SpeechSynthesizer,
    TrendSource,
};

/// Failure switches shared by every mock provider.
#[derive(Debug, Default)]
struct Failures {
    /// If set, the next call fails with this error.
    next_error: RwLock<Option<ProviderError>>,
    /// Every call fails while set.
    always: RwLock<bool>,
}

impl Failures {
    async fn check(&self, provider: &str) -> Result<(), ProviderError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if *self.always.read().await {
            return Err(ProviderError::failed(provider, "mock failure"));
        }
        Ok(())
    }
}

async fn write_placeholder(provider: &str, path: &Path, body: &[u8]) -> Result<(), ProviderError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ProviderError::failed(provider, e))?;
    }
    tokio::fs::write(path, body)
        .await
        .map_err(|e| ProviderError::failed(provider, e))
}

// ============================================================================
// Script analysis
// ============================================================================

/// Mock implementation of the ScriptAnalyzer trait.
///
/// Returns the configured analysis (the default analysis unless changed) and
/// records every request.
#[derive(Debug)]
pub struct MockScriptAnalyzer {
    name: String,
    analysis: Arc<RwLock<ScriptAnalysis>>,
    requests: Arc<RwLock<Vec<AnalysisRequest>>>,
    failures: Arc<Failures>,
}

impl Default for MockScriptAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScriptAnalyzer {
    pub fn new() -> Self {
        Self::named("mock_analyzer")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            analysis: Arc::new(RwLock::new(ScriptAnalysis::default())),
            requests: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(Failures::default()),
        }
    }

    pub async fn set_analysis(&self, analysis: ScriptAnalysis) {
        *self.analysis.write().await = analysis;
    }

    pub async fn set_next_error(&self, error: ProviderError) {
        *self.failures.next_error.write().await = Some(error);
    }

    /// Make every call fail until cleared.
    pub async fn set_failing(&self, failing: bool) {
        *self.failures.always.write().await = failing;
    }

    pub async fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

impl Provider for MockScriptAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ScriptAnalyzer for MockScriptAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<ScriptAnalysis, ProviderError> {
        self.requests.write().await.push(request.clone());
        self.failures.check(&self.name).await?;
        Ok(self.analysis.read().await.clone())
    }
}

// ============================================================================
// Drafting
// ============================================================================

/// Mock implementation of the ContentDrafter trait.
#[derive(Debug)]
pub struct MockContentDrafter {
    name: String,
    draft: Arc<RwLock<ContentDraft>>,
    requests: Arc<RwLock<Vec<DraftRequest>>>,
    failures: Arc<Failures>,
}

impl Default for MockContentDrafter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContentDrafter {
    /// A drafter returning a three-scene draft.
    pub fn new() -> Self {
        Self::with_draft(fixtures::draft(&[4.0, 4.0, 4.0]))
    }

    pub fn with_draft(draft: ContentDraft) -> Self {
        Self {
            name: "mock_drafter".to_string(),
            draft: Arc::new(RwLock::new(draft)),
            requests: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(Failures::default()),
        }
    }

    pub async fn set_draft(&self, draft: ContentDraft) {
        *self.draft.write().await = draft;
    }

    pub async fn set_next_error(&self, error: ProviderError) {
        *self.failures.next_error.write().await = Some(error);
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failures.always.write().await = failing;
    }

    pub async fn requests(&self) -> Vec<DraftRequest> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

impl Provider for MockContentDrafter {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ContentDrafter for MockContentDrafter {
    async fn draft(&self, request: &DraftRequest) -> Result<ContentDraft, ProviderError> {
        self.requests.write().await.push(request.clone());
        self.failures.check(&self.name).await?;
        Ok(self.draft.read().await.clone())
    }
}

// ============================================================================
// Speech
// ============================================================================

/// Mock implementation of the SpeechSynthesizer trait.
///
/// Writes a small placeholder file to the requested output.
#[derive(Debug)]
pub struct MockSpeechSynthesizer {
    name: String,
    requests: Arc<RwLock<Vec<SpeechRequest>>>,
    failures: Arc<Failures>,
}

impl Default for MockSpeechSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpeechSynthesizer {
    pub fn new() -> Self {
        Self::named("mock_speech")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            requests: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(Failures::default()),
        }
    }

    pub async fn set_next_error(&self, error: ProviderError) {
        *self.failures.next_error.write().await = Some(error);
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failures.always.write().await = failing;
    }

    pub async fn requests(&self) -> Vec<SpeechRequest> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

impl Provider for MockSpeechSynthesizer {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeechSynthesizer {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<(), ProviderError> {
        self.requests.write().await.push(request.clone());
        self.failures.check(&self.name).await?;
        write_placeholder(&self.name, &request.output, b"mock-voice").await
    }
}

// ============================================================================
// Images
// ============================================================================

/// Mock implementation of the ImageSynthesizer trait.
///
/// Prompts can be made to fail outright or to be refused on policy grounds,
/// by substring.
#[derive(Debug)]
pub struct MockImageSynthesizer {
    name: String,
    requests: Arc<RwLock<Vec<ImageRequest>>>,
    failing_prompts: Arc<RwLock<Vec<String>>>,
    refused_prompts: Arc<RwLock<Vec<String>>>,
    failures: Arc<Failures>,
}

impl Default for MockImageSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockImageSynthesizer {
    pub fn new() -> Self {
        Self {
            name: "mock_image".to_string(),
            requests: Arc::new(RwLock::new(Vec::new())),
            failing_prompts: Arc::new(RwLock::new(Vec::new())),
            refused_prompts: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(Failures::default()),
        }
    }

    /// Fail every prompt containing `fragment`.
    pub async fn fail_prompts_containing(&self, fragment: &str) {
        self.failing_prompts.write().await.push(fragment.to_string());
    }

    /// Refuse every prompt containing `fragment` as a policy violation.
    pub async fn refuse_prompts_containing(&self, fragment: &str) {
        self.refused_prompts.write().await.push(fragment.to_string());
    }

    pub async fn set_next_error(&self, error: ProviderError) {
        *self.failures.next_error.write().await = Some(error);
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failures.always.write().await = failing;
    }

    pub async fn requests(&self) -> Vec<ImageRequest> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

impl Provider for MockImageSynthesizer {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ImageSynthesizer for MockImageSynthesizer {
    async fn generate(&self, request: &ImageRequest) -> Result<(), ProviderError> {
        self.requests.write().await.push(request.clone());
        self.failures.check(&self.name).await?;

        let prompt = &request.prompt;
        if self.refused_prompts.read().await.iter().any(|f| prompt.contains(f.as_str())) {
            return Err(ProviderError::policy_violation(&self.name, "prompt refused"));
        }
        if self.failing_prompts.read().await.iter().any(|f| prompt.contains(f.as_str())) {
            return Err(ProviderError::failed(&self.name, "mock image failure"));
        }
        write_placeholder(&self.name, &request.output, b"mock-image").await
    }
}

// ============================================================================
// Music
// ============================================================================

/// Mock implementation of the MusicSynthesizer trait.
#[derive(Debug)]
pub struct MockMusicSynthesizer {
    name: String,
    requests: Arc<RwLock<Vec<MusicRequest>>>,
    failures: Arc<Failures>,
}

impl Default for MockMusicSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMusicSynthesizer {
    pub fn new() -> Self {
        Self {
            name: "mock_music".to_string(),
            requests: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(Failures::default()),
        }
    }

    pub async fn set_next_error(&self, error: ProviderError) {
        *self.failures.next_error.write().await = Some(error);
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failures.always.write().await = failing;
    }

    pub async fn requests(&self) -> Vec<MusicRequest> {
        self.requests.read().await.clone()
    }
}

impl Provider for MockMusicSynthesizer {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl MusicSynthesizer for MockMusicSynthesizer {
    async fn compose(&self, request: &MusicRequest) -> Result<(), ProviderError> {
        self.requests.write().await.push(request.clone());
        self.failures.check(&self.name).await?;
        write_placeholder(&self.name, &request.output, b"mock-music").await
    }
}

// ============================================================================
// Trend discovery
// ============================================================================

/// Mock implementation of the TrendSource trait.
///
/// Can answer after a delay, or never answer at all.
#[derive(Debug)]
pub struct MockTrendSource {
    name: String,
    candidates: Arc<RwLock<Vec<TrendCandidate>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    hang: Arc<RwLock<bool>>,
    topics: Arc<RwLock<Vec<String>>>,
    failures: Arc<Failures>,
}

impl Default for MockTrendSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTrendSource {
    pub fn new() -> Self {
        Self::with_candidates(Vec::new())
    }

    pub fn with_candidates(candidates: Vec<TrendCandidate>) -> Self {
        Self {
            name: "mock_trends".to_string(),
            candidates: Arc::new(RwLock::new(candidates)),
            delay: Arc::new(RwLock::new(None)),
            hang: Arc::new(RwLock::new(false)),
            topics: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(Failures::default()),
        }
    }

    /// A source that never returns.
    pub fn hanging() -> Self {
        let mut source = Self::new();
        source.hang = Arc::new(RwLock::new(true));
        source
    }

    pub async fn set_candidates(&self, candidates: Vec<TrendCandidate>) {
        *self.candidates.write().await = candidates;
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn set_next_error(&self, error: ProviderError) {
        *self.failures.next_error.write().await = Some(error);
    }

    /// Topics queried so far.
    pub async fn topics(&self) -> Vec<String> {
        self.topics.read().await.clone()
    }
}

impl Provider for MockTrendSource {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl TrendSource for MockTrendSource {
    async fn discover(&self, topic: &str) -> Result<Vec<TrendCandidate>, ProviderError> {
        self.topics.write().await.push(topic.to_string());
        if *self.hang.read().await {
            futures::future::pending::<()>().await;
        }
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.failures.check(&self.name).await?;
        Ok(self.candidates.read().await.clone())
    }
}

/// Test fixtures for content.
pub mod fixtures {
    use crate::content::{AspectRatio, ContentDraft, Scene, ScriptAnalysis, TrendCandidate};

    /// A draft with one scene per duration, all 9:16.
    pub fn draft(scene_durations: &[f64]) -> ContentDraft {
        ContentDraft {
            title: "The Deep".to_string(),
            script: "Scene 1: Down here, light never reaches. (pause)\n\n\nScene 2: Yet life finds a way.".to_string(),
            hook_selected: "You have never seen this.".to_string(),
            emotional_payoff: "Wonder".to_string(),
            caption: "#ocean #deepsea".to_string(),
            visual_prompt: "A glowing creature in the abyss".to_string(),
            visual_style: "Moody, bioluminescent, cinematic".to_string(),
            scenes: scene_durations
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    Scene::new(format!("Deep sea shot {}", i + 1))
                        .with_duration(*d)
                        .with_aspect_ratio(AspectRatio::Portrait)
                })
                .collect(),
            music_mood: "Dark ambient drones".to_string(),
            is_aigc: true,
        }
    }

    /// A non-default analysis, distinguishable from the fallback.
    pub fn analysis() -> ScriptAnalysis {
        ScriptAnalysis {
            hook_technique: "Open loop".to_string(),
            hook_variations: vec![
                "What lives down there?".to_string(),
                "Nobody has filmed this.".to_string(),
                "Stay for the last shot.".to_string(),
            ],
            emotional_trigger: "Curiosity".to_string(),
            structural_pattern: "Reveal".to_string(),
            target_audience_insight: "Nature fans".to_string(),
            virality_score: 8,
        }
    }

    pub fn trend(url: &str) -> TrendCandidate {
        TrendCandidate {
            source_id: url.rsplit('/').next().unwrap_or(url).to_string(),
            description: format!("Trending clip {}", url),
            hashtags: vec!["#trend".to_string()],
            music_id: None,
            transcript: None,
            author: "creator".to_string(),
            url: url.to_string(),
        }
    }
}
