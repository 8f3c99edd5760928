//! Pipeline lifecycle integration tests.
//!
//! These drive the full five-stage engine with mock providers and the mock
//! media engine:
//! - Resumption without re-invoking completed providers
//! - Fallback ordering inside a capability chain
//! - Output duration always equal to the voice duration
//! - Scene failure handling and stage-fatal errors
//! - Progress reporting and the discovery deadline

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use reelsmith_core::{
    artifacts::{ArtifactIndex, ArtifactKind, ArtifactStore},
    content::{ContentDraft, ScriptAnalysis},
    media::{MediaEngine, RenderSpec},
    pipeline::{EngineConfig, PipelineEngine, ASSEMBLY_FAILED, SCENES_FAILED, VOICE_FAILED},
    providers::{
        FallbackChain, PanZoomAnimator, ProviderError, ProviderSet, SpeechSynthesizer,
        TrendSource,
    },
    run::{
        CreateRunRequest, RunError, RunField, RunFilter, RunRecord, RunStatus, RunStore,
        SqliteRunStore,
    },
    testing::{
        fixtures, MockContentDrafter, MockImageSynthesizer, MockMediaEngine,
        MockMusicSynthesizer, MockScriptAnalyzer, MockSpeechSynthesizer, MockTrendSource,
    },
};

/// Run store that remembers every progress value it was asked to write.
struct RecordingStore {
    inner: SqliteRunStore,
    progress: Mutex<Vec<(RunStatus, u8)>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: SqliteRunStore::in_memory().expect("Failed to create run store"),
            progress: Mutex::new(Vec::new()),
        }
    }

    fn progress_log(&self) -> Vec<(RunStatus, u8)> {
        self.progress.lock().unwrap().clone()
    }
}

impl RunStore for RecordingStore {
    fn create(&self, request: CreateRunRequest) -> Result<RunRecord, RunError> {
        self.inner.create(request)
    }

    fn get(&self, id: &str) -> Result<Option<RunRecord>, RunError> {
        self.inner.get(id)
    }

    fn list(&self, filter: &RunFilter) -> Result<Vec<RunRecord>, RunError> {
        self.inner.list(filter)
    }

    fn count(&self, filter: &RunFilter) -> Result<i64, RunError> {
        self.inner.count(filter)
    }

    fn find_latest_failed_by_topic(&self, topic: &str) -> Result<Option<RunRecord>, RunError> {
        self.inner.find_latest_failed_by_topic(topic)
    }

    fn begin_attempt(&self, id: &str) -> Result<RunRecord, RunError> {
        self.progress.lock().unwrap().clear();
        self.inner.begin_attempt(id)
    }

    fn update_progress(
        &self,
        id: &str,
        status: RunStatus,
        progress: u8,
    ) -> Result<RunRecord, RunError> {
        self.progress.lock().unwrap().push((status, progress));
        self.inner.update_progress(id, status, progress)
    }

    fn update_field(&self, id: &str, field: RunField) -> Result<(), RunError> {
        self.inner.update_field(id, field)
    }

    fn fail(&self, id: &str, error: &str) -> Result<RunRecord, RunError> {
        self.inner.fail(id, error)
    }

    fn transition(
        &self,
        id: &str,
        expected: RunStatus,
        next: RunStatus,
        operation: &str,
    ) -> Result<RunRecord, RunError> {
        self.inner.transition(id, expected, next, operation)
    }

    fn delete(&self, id: &str) -> Result<RunRecord, RunError> {
        self.inner.delete(id)
    }
}

/// Test helper wiring the engine to mocks.
struct TestHarness {
    engine: PipelineEngine,
    store: Arc<RecordingStore>,
    media: Arc<MockMediaEngine>,
    analyzer: Arc<MockScriptAnalyzer>,
    drafter: Arc<MockContentDrafter>,
    speech: Arc<MockSpeechSynthesizer>,
    image: Arc<MockImageSynthesizer>,
    music: Arc<MockMusicSynthesizer>,
    artifacts: Arc<ArtifactIndex>,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::build(EngineConfig::default(), Vec::new(), None)
    }

    fn build(
        config: EngineConfig,
        trend_sources: Vec<Arc<dyn TrendSource>>,
        speech_chain: Option<FallbackChain<dyn SpeechSynthesizer>>,
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let artifacts = Arc::new(ArtifactIndex::new(Arc::new(ArtifactStore::new(
            temp_dir.path().join("assets"),
            "/assets",
        ))));

        let store = Arc::new(RecordingStore::new());
        let media = Arc::new(MockMediaEngine::new());
        let analyzer = Arc::new(MockScriptAnalyzer::new());
        let drafter = Arc::new(MockContentDrafter::new());
        let speech = Arc::new(MockSpeechSynthesizer::new());
        let image = Arc::new(MockImageSynthesizer::new());
        let music = Arc::new(MockMusicSynthesizer::new());

        let mut providers = ProviderSet::empty();
        providers.analyzer = FallbackChain::new("analysis", vec![analyzer.clone() as _]);
        providers.drafter = FallbackChain::new("drafting", vec![drafter.clone() as _]);
        providers.speech = speech_chain
            .unwrap_or_else(|| FallbackChain::new("speech", vec![speech.clone() as _]));
        providers.image = FallbackChain::new("image", vec![image.clone() as _]);
        providers.video = FallbackChain::new(
            "video",
            vec![Arc::new(PanZoomAnimator::new(
                media.clone() as Arc<dyn MediaEngine>,
                config.fps,
            )) as _],
        );
        providers.music = FallbackChain::new("music", vec![music.clone() as _]);
        providers.trend_sources = trend_sources;

        let engine = PipelineEngine::new(
            config,
            store.clone() as Arc<dyn RunStore>,
            providers,
            artifacts.clone(),
            media.clone() as Arc<dyn MediaEngine>,
        );

        Self {
            engine,
            store,
            media,
            analyzer,
            drafter,
            speech,
            image,
            music,
            artifacts,
            _temp_dir: temp_dir,
        }
    }

    fn create_run(&self, topic: &str) -> String {
        self.store
            .create(CreateRunRequest {
                topic: topic.to_string(),
                tone: "Mysterious".to_string(),
                duration_secs: 30,
                platform: "TikTok".to_string(),
                use_captions: true,
            })
            .expect("Failed to create run")
            .id
    }

    async fn set_voice_duration(&self, run_id: &str, secs: f64) {
        let voice = self.artifacts.target(run_id, ArtifactKind::Voice);
        self.media.set_duration(&voice.path, secs).await;
    }

    fn record(&self, run_id: &str) -> RunRecord {
        self.store.get(run_id).unwrap().expect("run exists")
    }

    async fn final_duration(&self, run_id: &str) -> Option<f64> {
        let output = self.artifacts.target(run_id, ArtifactKind::FinalVideo);
        self.media.duration_of(&output.path).await
    }

    async fn mix_loops(&self) -> Vec<u32> {
        self.media
            .rendered_jobs()
            .await
            .into_iter()
            .filter_map(|job| match job.spec {
                RenderSpec::Mix(mix) => Some(mix.video_loops),
                _ => None,
            })
            .collect()
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_full_run_reaches_pending_approval() {
    let harness = TestHarness::new();
    let run_id = harness.create_run("Deep sea creatures");
    harness.set_voice_duration(&run_id, 10.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert!(state.error.is_none());
    assert_eq!(state.scene_clips.len(), 3);
    assert!(state.music.is_some());

    let record = harness.record(&run_id);
    assert_eq!(record.status, RunStatus::PendingApproval);
    assert_eq!(record.progress, 100);
    assert_eq!(
        record.video_url.as_deref(),
        Some(format!("/assets/animated_{}.mp4", run_id).as_str())
    );
    assert_eq!(
        record.voice_url.as_deref(),
        Some(format!("/assets/voice_{}.mp3", run_id).as_str())
    );
    assert_eq!(
        record.music_url.as_deref(),
        Some(format!("/assets/music_{}.mp3", run_id).as_str())
    );
    assert_eq!(record.analysis, Some(ScriptAnalysis::default()));
    assert_eq!(record.draft, Some(fixtures::draft(&[4.0, 4.0, 4.0])));
    assert!(record.error.is_none());
}

#[tokio::test]
async fn test_voice_text_is_normalised() {
    let harness = TestHarness::new();
    let run_id = harness.create_run("Deep sea creatures");
    harness.set_voice_duration(&run_id, 10.0).await;

    harness.engine.execute(&run_id).await.unwrap();

    let requests = harness.speech.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].text,
        "Down here, light never reaches. \n Yet life finds a way."
    );
}

#[tokio::test]
async fn test_scene_prompts_carry_visual_style() {
    let harness = TestHarness::new();
    let run_id = harness.create_run("Deep sea creatures");
    harness.set_voice_duration(&run_id, 10.0).await;

    harness.engine.execute(&run_id).await.unwrap();

    let prompts: Vec<String> = harness
        .image
        .requests()
        .await
        .into_iter()
        .map(|r| r.prompt)
        .collect();
    assert_eq!(
        prompts[0],
        "Deep sea shot 1 | STYLE: Moody, bioluminescent, cinematic"
    );
    assert_eq!(prompts.len(), 3);
}

#[tokio::test]
async fn test_music_request_uses_mood_and_scene_total() {
    let harness = TestHarness::new();
    let run_id = harness.create_run("Deep sea creatures");
    harness.set_voice_duration(&run_id, 10.0).await;

    harness.engine.execute(&run_id).await.unwrap();

    let requests = harness.music.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "Background music: Dark ambient drones");
    assert_close(requests[0].duration_secs, 12.0);
    assert_close(requests[0].generative_duration(), 12.0);
}

#[tokio::test]
async fn test_music_failure_is_advisory() {
    let harness = TestHarness::new();
    harness.music.set_failing(true).await;
    let run_id = harness.create_run("Deep sea creatures");
    harness.set_voice_duration(&run_id, 10.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert!(state.error.is_none());
    assert!(state.music.is_none());
    let record = harness.record(&run_id);
    assert_eq!(record.status, RunStatus::PendingApproval);
    assert!(record.music_url.is_none());

    let mix = harness
        .media
        .rendered_jobs()
        .await
        .into_iter()
        .find_map(|job| match job.spec {
            RenderSpec::Mix(mix) => Some(mix),
            _ => None,
        })
        .unwrap();
    assert!(mix.music.is_none());
}

// ============================================================================
// Duration invariant
// ============================================================================

#[tokio::test]
async fn test_short_sequence_loops_to_voice_duration() {
    let harness = TestHarness::new();
    harness.drafter.set_draft(fixtures::draft(&[4.0])).await;
    let run_id = harness.create_run("Volcanoes");
    harness.set_voice_duration(&run_id, 10.0).await;

    harness.engine.execute(&run_id).await.unwrap();

    assert_close(harness.final_duration(&run_id).await.unwrap(), 10.0);
    assert_eq!(harness.mix_loops().await, vec![3]);
}

#[tokio::test]
async fn test_long_sequence_is_trimmed_to_voice_duration() {
    let harness = TestHarness::new();
    harness.drafter.set_draft(fixtures::draft(&[5.0, 5.0])).await;
    let run_id = harness.create_run("Volcanoes");
    harness.set_voice_duration(&run_id, 4.0).await;

    harness.engine.execute(&run_id).await.unwrap();

    assert_close(harness.final_duration(&run_id).await.unwrap(), 4.0);
    assert_eq!(harness.mix_loops().await, vec![1]);
}

// ============================================================================
// Resumption
// ============================================================================

#[tokio::test]
async fn test_resume_does_not_reinvoke_completed_stages() {
    let harness = TestHarness::new();
    harness.analyzer.set_analysis(fixtures::analysis()).await;
    harness.speech.set_failing(true).await;
    let run_id = harness.create_run("Ancient Rome");
    harness.set_voice_duration(&run_id, 8.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();
    assert_eq!(state.error.as_deref(), Some(VOICE_FAILED));

    let failed = harness.record(&run_id);
    assert_eq!(failed.status, RunStatus::Error);
    assert_eq!(failed.error.as_deref(), Some(VOICE_FAILED));
    let analysis_json = serde_json::to_string(&failed.analysis).unwrap();
    let draft_json = serde_json::to_string(&failed.draft).unwrap();

    harness.speech.set_failing(false).await;
    harness.store.begin_attempt(&run_id).unwrap();
    let state = harness.engine.execute(&run_id).await.unwrap();

    assert!(state.error.is_none());
    assert_eq!(harness.analyzer.call_count().await, 1);
    assert_eq!(harness.drafter.call_count().await, 1);
    assert_eq!(harness.speech.call_count().await, 2);

    let resumed = harness.record(&run_id);
    assert_eq!(resumed.status, RunStatus::PendingApproval);
    assert_eq!(serde_json::to_string(&resumed.analysis).unwrap(), analysis_json);
    assert_eq!(serde_json::to_string(&resumed.draft).unwrap(), draft_json);
}

#[tokio::test]
async fn test_resume_reuses_voice_and_scene_clips() {
    let harness = TestHarness::new();
    let run_id = harness.create_run("Ancient Rome");
    harness.set_voice_duration(&run_id, 8.0).await;
    harness.media.fail_render_kind("mix").await;

    let state = harness.engine.execute(&run_id).await.unwrap();
    assert_eq!(state.error.as_deref(), Some(ASSEMBLY_FAILED));
    assert_eq!(harness.media.render_count("pan_zoom").await, 3);

    harness.media.clear_failures().await;
    harness.store.begin_attempt(&run_id).unwrap();
    let state = harness.engine.execute(&run_id).await.unwrap();

    assert!(state.error.is_none());
    assert_eq!(harness.speech.call_count().await, 1);
    assert_eq!(harness.image.call_count().await, 3);
    assert_eq!(harness.media.render_count("pan_zoom").await, 3);
    assert_eq!(harness.media.render_count("mix").await, 2);
}

#[tokio::test]
async fn test_resumed_zero_scene_draft_is_redrafted() {
    let harness = TestHarness::new();
    harness.drafter.set_draft(fixtures::draft(&[])).await;
    harness.speech.set_failing(true).await;
    let run_id = harness.create_run("Northern lights");
    harness.set_voice_duration(&run_id, 6.0).await;

    harness.engine.execute(&run_id).await.unwrap();
    let failed = harness.record(&run_id);
    assert!(failed.draft.as_ref().is_some_and(|d| d.scenes.is_empty()));

    harness.drafter.set_draft(fixtures::draft(&[3.0, 3.0])).await;
    harness.speech.set_failing(false).await;
    harness.store.begin_attempt(&run_id).unwrap();
    let state = harness.engine.execute(&run_id).await.unwrap();

    assert!(state.error.is_none());
    assert_eq!(harness.drafter.call_count().await, 2);
    assert_eq!(harness.record(&run_id).draft.unwrap().scenes.len(), 2);
    assert_eq!(state.scene_clips.len(), 2);
}

// ============================================================================
// Degraded and fatal paths
// ============================================================================

#[tokio::test]
async fn test_zero_scene_draft_uses_synthetic_scene() {
    let harness = TestHarness::new();
    harness.drafter.set_draft(fixtures::draft(&[])).await;
    let run_id = harness.create_run("Northern lights");
    harness.set_voice_duration(&run_id, 6.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert!(state.error.is_none());
    assert_eq!(state.scene_clips.len(), 1);
    let requests = harness.image.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].prompt.starts_with("A glowing creature in the abyss | STYLE:"));
}

#[tokio::test]
async fn test_exhausted_text_chains_fall_back_to_defaults() {
    let harness = TestHarness::new();
    harness.analyzer.set_failing(true).await;
    harness.drafter.set_failing(true).await;
    let run_id = harness.create_run("Quantum physics");
    harness.set_voice_duration(&run_id, 5.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert_eq!(state.analysis, Some(ScriptAnalysis::default()));
    assert_eq!(state.draft, Some(ContentDraft::error_placeholder()));
    // The error draft still yields a synthetic scene, so the run completes.
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_all_scenes_failing_is_fatal() {
    let harness = TestHarness::new();
    harness.image.set_failing(true).await;
    let run_id = harness.create_run("Storm chasing");
    harness.set_voice_duration(&run_id, 10.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert_eq!(state.error.as_deref(), Some(SCENES_FAILED));
    assert!(state.final_video.is_none());
    let record = harness.record(&run_id);
    assert_eq!(record.status, RunStatus::Error);
    assert_eq!(record.error.as_deref(), Some(SCENES_FAILED));
    assert!(record.video_url.is_none());
    assert_eq!(harness.media.render_count("mix").await, 0);
}

#[tokio::test]
async fn test_failed_scenes_are_dropped() {
    let harness = TestHarness::new();
    harness.image.fail_prompts_containing("shot 2").await;
    let run_id = harness.create_run("Storm chasing");
    harness.set_voice_duration(&run_id, 10.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert!(state.error.is_none());
    assert_eq!(state.scene_clips.len(), 2);
    assert!(harness
        .artifacts
        .lookup(&run_id, ArtifactKind::SceneClip(1))
        .await
        .is_none());

    let concat = harness
        .media
        .rendered_jobs()
        .await
        .into_iter()
        .find_map(|job| match job.spec {
            RenderSpec::Concat(concat) => Some(concat),
            _ => None,
        })
        .unwrap();
    assert_eq!(concat.clips.len(), 2);
}

#[tokio::test]
async fn test_failed_animation_drops_scene() {
    let harness = TestHarness::new();
    let run_id = harness.create_run("Storm chasing");
    harness.set_voice_duration(&run_id, 10.0).await;
    let image = harness.artifacts.target(&run_id, ArtifactKind::SceneImage(0));
    harness.media.fail_input(&image.path).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert!(state.error.is_none());
    assert_eq!(state.scene_clips.len(), 2);
}

#[tokio::test]
async fn test_policy_refusal_retries_once_desensitized() {
    let harness = TestHarness::new();
    let mut draft = fixtures::draft(&[4.0]);
    draft.scenes[0].prompt = "A blood red moon".to_string();
    harness.drafter.set_draft(draft).await;
    harness.image.refuse_prompts_containing("blood").await;
    let run_id = harness.create_run("Eclipse");
    harness.set_voice_duration(&run_id, 6.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert!(state.error.is_none());
    let prompts: Vec<String> = harness
        .image
        .requests()
        .await
        .into_iter()
        .map(|r| r.prompt)
        .collect();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].starts_with("A dramatic red moon"));
}

#[tokio::test]
async fn test_policy_refusal_retries_only_once() {
    let harness = TestHarness::new();
    let mut draft = fixtures::draft(&[4.0]);
    draft.scenes[0].prompt = "A lonely moon".to_string();
    harness.drafter.set_draft(draft).await;
    harness.image.refuse_prompts_containing("moon").await;
    let run_id = harness.create_run("Eclipse");
    harness.set_voice_duration(&run_id, 6.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert_eq!(state.error.as_deref(), Some(SCENES_FAILED));
    assert_eq!(harness.image.call_count().await, 2);
}

#[tokio::test]
async fn test_missing_run_is_an_engine_error() {
    let harness = TestHarness::new();
    let err = harness.engine.execute("no-such-run").await.unwrap_err();
    assert!(err.to_string().contains("no-such-run"));
}

// ============================================================================
// Fallback ordering
// ============================================================================

#[tokio::test]
async fn test_speech_chain_stops_at_first_success() {
    let first = Arc::new(MockSpeechSynthesizer::named("first"));
    let second = Arc::new(MockSpeechSynthesizer::named("second"));
    let third = Arc::new(MockSpeechSynthesizer::named("third"));
    first.set_failing(true).await;

    let chain = FallbackChain::new(
        "speech",
        vec![first.clone() as _, second.clone() as _, third.clone() as _],
    );
    let harness = TestHarness::build(EngineConfig::default(), Vec::new(), Some(chain));
    let run_id = harness.create_run("Fallbacks");
    harness.set_voice_duration(&run_id, 5.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert!(state.error.is_none());
    assert_eq!(first.call_count().await, 1);
    assert_eq!(second.call_count().await, 1);
    assert_eq!(third.call_count().await, 0);
}

#[tokio::test]
async fn test_exhausted_speech_chain_is_fatal() {
    let first = Arc::new(MockSpeechSynthesizer::named("first"));
    let second = Arc::new(MockSpeechSynthesizer::named("second"));
    first.set_failing(true).await;
    second
        .set_next_error(ProviderError::failed("second", "quota exceeded"))
        .await;

    let chain = FallbackChain::new("speech", vec![first.clone() as _, second.clone() as _]);
    let harness = TestHarness::build(EngineConfig::default(), Vec::new(), Some(chain));
    let run_id = harness.create_run("Fallbacks");

    let state = harness.engine.execute(&run_id).await.unwrap();

    assert_eq!(state.error.as_deref(), Some(VOICE_FAILED));
    assert!(harness
        .artifacts
        .lookup(&run_id, ArtifactKind::Voice)
        .await
        .is_none());
    assert_eq!(harness.image.call_count().await, 0);
}

// ============================================================================
// Progress and discovery
// ============================================================================

#[tokio::test]
async fn test_progress_is_monotonic_and_ends_at_100() {
    let harness = TestHarness::new();
    let run_id = harness.create_run("Deep sea creatures");
    harness.set_voice_duration(&run_id, 10.0).await;

    harness.engine.execute(&run_id).await.unwrap();

    let log = harness.store.progress_log();
    let values: Vec<u8> = log.iter().map(|(_, p)| *p).collect();
    assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
    assert_eq!(values.first(), Some(&10));
    assert_eq!(log.last(), Some(&(RunStatus::PendingApproval, 100)));
    for checkpoint in [15, 20, 25, 40, 45, 60, 65, 85, 90] {
        assert!(values.contains(&checkpoint), "missing {}", checkpoint);
    }
}

#[tokio::test]
async fn test_resumed_progress_is_monotonic() {
    let harness = TestHarness::new();
    harness.speech.set_failing(true).await;
    let run_id = harness.create_run("Deep sea creatures");
    harness.set_voice_duration(&run_id, 10.0).await;
    harness.engine.execute(&run_id).await.unwrap();

    harness.speech.set_failing(false).await;
    harness.store.begin_attempt(&run_id).unwrap();
    harness.engine.execute(&run_id).await.unwrap();

    let values: Vec<u8> = harness.store.progress_log().iter().map(|(_, p)| *p).collect();
    assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
    assert_eq!(values.last(), Some(&100));
    // Resumed stages jump straight to their completion checkpoint.
    assert!(!values.contains(&15));
    assert!(!values.contains(&25));
}

#[tokio::test]
async fn test_hanging_trend_source_is_cut_off_at_deadline() {
    let config = EngineConfig {
        discovery_timeout_ms: 200,
        ..Default::default()
    };
    let harness = TestHarness::build(
        config,
        vec![Arc::new(MockTrendSource::hanging()) as Arc<dyn TrendSource>],
        None,
    );
    let run_id = harness.create_run("Slow sources");
    harness.set_voice_duration(&run_id, 5.0).await;

    let started = tokio::time::Instant::now();
    let state = tokio::time::timeout(Duration::from_secs(10), harness.engine.execute(&run_id))
        .await
        .expect("discovery must not hang")
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(state.candidates.is_empty());
    assert!(state.selected_trend.is_none());
    assert!(state.error.is_none());
    assert!(harness.record(&run_id).trend_source_url.is_none());
    assert_eq!(harness.analyzer.requests().await[0].context, "Slow sources");
}

#[tokio::test]
async fn test_discovery_merges_sources_and_selects_first() {
    let config = EngineConfig {
        discovery_timeout_ms: 300,
        max_candidates: 3,
        ..Default::default()
    };
    let fast = MockTrendSource::with_candidates(vec![
        fixtures::trend("https://t.example/1"),
        fixtures::trend("https://t.example/2"),
    ]);
    let overlapping = MockTrendSource::with_candidates(vec![
        fixtures::trend("https://t.example/2"),
        fixtures::trend("https://t.example/3"),
        fixtures::trend("https://t.example/4"),
    ]);
    let failing = MockTrendSource::new();
    failing
        .set_next_error(ProviderError::failed("mock_trends", "rate limited"))
        .await;

    let harness = TestHarness::build(
        config,
        vec![
            Arc::new(fast) as Arc<dyn TrendSource>,
            Arc::new(MockTrendSource::hanging()) as Arc<dyn TrendSource>,
            Arc::new(overlapping) as Arc<dyn TrendSource>,
            Arc::new(failing) as Arc<dyn TrendSource>,
        ],
        None,
    );
    let run_id = harness.create_run("Trending");
    harness.set_voice_duration(&run_id, 5.0).await;

    let state = harness.engine.execute(&run_id).await.unwrap();

    let urls: Vec<&str> = state.candidates.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://t.example/1", "https://t.example/2", "https://t.example/3"]
    );
    assert_eq!(
        harness.record(&run_id).trend_source_url.as_deref(),
        Some("https://t.example/1")
    );
    assert!(harness.analyzer.requests().await[0]
        .context
        .starts_with("Trending clip https://t.example/1"));
}
