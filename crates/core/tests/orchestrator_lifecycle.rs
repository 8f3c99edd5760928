//! Orchestrator lifecycle integration tests.
//!
//! These tests verify the run lifecycle through the orchestrator:
//! start -> pipeline stages -> pending approval -> approved -> published,
//! plus rejection, resumption of failed runs and request validation.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use reelsmith_core::{
    artifacts::{ArtifactIndex, ArtifactStore},
    media::MediaEngine,
    orchestrator::{OrchestratorConfig, PublishError},
    pipeline::{EngineConfig, VOICE_FAILED},
    providers::{FallbackChain, PanZoomAnimator, ProviderSet},
    run::{
        ApprovalAction, CreateRunRequest, RunError, RunField, RunFilter, RunRecord, RunStatus,
        RunStore, SqliteRunStore,
    },
    testing::{
        MockContentDrafter, MockImageSynthesizer, MockMediaEngine, MockMusicSynthesizer,
        MockPublisher, MockScriptAnalyzer, MockSpeechSynthesizer,
    },
    OrchestratorError, PipelineEngine, RunOrchestrator, StartRunRequest,
};

/// Run store that holds the engine back for a while after it records a failure.
struct SlowFailStore {
    inner: SqliteRunStore,
    fail_delay: Duration,
}

impl RunStore for SlowFailStore {
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
        self.inner.begin_attempt(id)
    }

    fn update_progress(
        &self,
        id: &str,
        status: RunStatus,
        progress: u8,
    ) -> Result<RunRecord, RunError> {
        self.inner.update_progress(id, status, progress)
    }

    fn update_field(&self, id: &str, field: RunField) -> Result<(), RunError> {
        self.inner.update_field(id, field)
    }

    fn fail(&self, id: &str, error: &str) -> Result<RunRecord, RunError> {
        let record = self.inner.fail(id, error)?;
        std::thread::sleep(self.fail_delay);
        Ok(record)
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

/// Test helper to create all dependencies for orchestrator testing.
struct TestHarness {
    orchestrator: RunOrchestrator,
    store: Arc<dyn RunStore>,
    speech: Arc<MockSpeechSynthesizer>,
    drafter: Arc<MockContentDrafter>,
    publisher: Arc<MockPublisher>,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        Self::build(None).await
    }

    /// Harness whose store stalls for `delay` after persisting a failure.
    async fn with_fail_delay(delay: Duration) -> Self {
        Self::build(Some(delay)).await
    }

    async fn build(fail_delay: Option<Duration>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("runs.db");
        let sqlite = SqliteRunStore::new(&db_path).expect("Failed to create run store");
        let store: Arc<dyn RunStore> = match fail_delay {
            Some(fail_delay) => Arc::new(SlowFailStore {
                inner: sqlite,
                fail_delay,
            }),
            None => Arc::new(sqlite),
        };
        let artifacts = Arc::new(ArtifactIndex::new(Arc::new(ArtifactStore::new(
            temp_dir.path().join("assets"),
            "/assets",
        ))));

        // Run ids are not known up front, so every probe reports the same length.
        let media = Arc::new(MockMediaEngine::new());
        media.set_default_duration(8.0).await;

        let speech = Arc::new(MockSpeechSynthesizer::new());
        let drafter = Arc::new(MockContentDrafter::new());
        let config = EngineConfig::default();

        let mut providers = ProviderSet::empty();
        providers.analyzer =
            FallbackChain::new("analysis", vec![Arc::new(MockScriptAnalyzer::new()) as _]);
        providers.drafter = FallbackChain::new("drafting", vec![drafter.clone() as _]);
        providers.speech = FallbackChain::new("speech", vec![speech.clone() as _]);
        providers.image =
            FallbackChain::new("image", vec![Arc::new(MockImageSynthesizer::new()) as _]);
        providers.video = FallbackChain::new(
            "video",
            vec![Arc::new(PanZoomAnimator::new(
                media.clone() as Arc<dyn MediaEngine>,
                config.fps,
            )) as _],
        );
        providers.music =
            FallbackChain::new("music", vec![Arc::new(MockMusicSynthesizer::new()) as _]);

        let engine = Arc::new(PipelineEngine::new(
            config,
            Arc::clone(&store),
            providers,
            artifacts,
            media as Arc<dyn MediaEngine>,
        ));

        let publisher = Arc::new(MockPublisher::new());
        let orchestrator = RunOrchestrator::new(
            OrchestratorConfig::default(),
            Arc::clone(&store),
            engine,
            publisher.clone(),
        );

        Self {
            orchestrator,
            store,
            speech,
            drafter,
            publisher,
            _temp_dir: temp_dir,
        }
    }

    /// Wait for the engine task of a run to finish.
    async fn wait_idle(&self, run_id: &str) {
        for _ in 0..200 {
            if !self.orchestrator.is_active(run_id).await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run {} still executing", run_id);
    }

    /// Wait for a run to reach the given status.
    async fn wait_for_status(&self, run_id: &str, status: RunStatus) {
        for _ in 0..200 {
            let record = self.store.get(run_id).unwrap().expect("run exists");
            if record.status == status {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run {} never reached {}", run_id, status);
    }

    async fn start_and_finish(&self, topic: &str) -> String {
        let run_id = self
            .orchestrator
            .start(StartRunRequest::new(topic))
            .await
            .expect("start");
        self.wait_idle(&run_id).await;
        run_id
    }
}

#[tokio::test]
async fn test_start_runs_to_pending_approval() {
    let harness = TestHarness::new().await;

    let run_id = harness.start_and_finish("Deep sea creatures").await;

    let record = harness.orchestrator.get(&run_id).unwrap().unwrap();
    assert_eq!(record.status, RunStatus::PendingApproval);
    assert_eq!(record.progress, 100);
    assert_eq!(record.topic, "Deep sea creatures");
    assert_eq!(record.tone, "Professional");
    assert_eq!(record.platform, "TikTok");
    assert!(record.video_url.is_some());
}

#[tokio::test]
async fn test_start_trims_topic_and_keeps_options() {
    let harness = TestHarness::new().await;

    let request = StartRunRequest::new("  Volcanoes  ")
        .with_tone("Playful")
        .with_duration(45);
    let run_id = harness.orchestrator.start(request).await.unwrap();
    harness.wait_idle(&run_id).await;

    let record = harness.orchestrator.get(&run_id).unwrap().unwrap();
    assert_eq!(record.topic, "Volcanoes");
    assert_eq!(record.tone, "Playful");
    assert_eq!(record.duration_secs, 45);
}

#[tokio::test]
async fn test_start_rejects_invalid_requests() {
    let harness = TestHarness::new().await;

    let err = harness
        .orchestrator
        .start(StartRunRequest::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Validation(_)));

    let err = harness
        .orchestrator
        .start(StartRunRequest::new("Volcanoes").with_duration(2))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Validation(_)));

    assert_eq!(harness.orchestrator.count(&RunFilter::new()).unwrap(), 0);
}

#[tokio::test]
async fn test_approve_publishes_run() {
    let harness = TestHarness::new().await;
    let run_id = harness.start_and_finish("Deep sea creatures").await;

    let record = harness
        .orchestrator
        .approve(&run_id, ApprovalAction::Approve)
        .await
        .unwrap();
    assert_eq!(record.status, RunStatus::Approved);

    harness.wait_for_status(&run_id, RunStatus::Published).await;
    assert_eq!(harness.publisher.published().await, vec![run_id]);
}

#[tokio::test]
async fn test_publish_failure_marks_run_failed() {
    let harness = TestHarness::new().await;
    harness
        .publisher
        .set_next_error(PublishError("upload rejected".to_string()))
        .await;
    let run_id = harness.start_and_finish("Deep sea creatures").await;

    harness
        .orchestrator
        .approve(&run_id, ApprovalAction::Approve)
        .await
        .unwrap();

    harness.wait_for_status(&run_id, RunStatus::Error).await;
    let record = harness.orchestrator.get(&run_id).unwrap().unwrap();
    assert_eq!(record.error.as_deref(), Some("publish failed: upload rejected"));
    assert!(harness.publisher.published().await.is_empty());
}

#[tokio::test]
async fn test_reject_run() {
    let harness = TestHarness::new().await;
    let run_id = harness.start_and_finish("Deep sea creatures").await;

    let record = harness
        .orchestrator
        .approve(&run_id, ApprovalAction::Reject)
        .await
        .unwrap();

    assert_eq!(record.status, RunStatus::Rejected);
    assert!(harness.publisher.published().await.is_empty());
}

#[tokio::test]
async fn test_approve_requires_pending_approval() {
    let harness = TestHarness::new().await;
    harness.speech.set_failing(true).await;
    let run_id = harness.start_and_finish("Deep sea creatures").await;

    let err = harness
        .orchestrator
        .approve(&run_id, ApprovalAction::Approve)
        .await
        .unwrap_err();

    match err {
        OrchestratorError::InvalidState {
            run_id: id,
            current,
            operation,
        } => {
            assert_eq!(id, run_id);
            assert_eq!(current, RunStatus::Error);
            assert_eq!(operation, "approve");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_approve_unknown_run() {
    let harness = TestHarness::new().await;

    let err = harness
        .orchestrator
        .approve("missing", ApprovalAction::Reject)
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_run() {
    let harness = TestHarness::new().await;
    let run_id = harness.start_and_finish("Deep sea creatures").await;

    let deleted = harness.orchestrator.delete(&run_id).unwrap();
    assert_eq!(deleted.id, run_id);
    assert!(harness.orchestrator.get(&run_id).unwrap().is_none());

    let err = harness.orchestrator.delete(&run_id).unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound(_)));
}

#[tokio::test]
async fn test_failed_topic_resumes_same_run() {
    let harness = TestHarness::new().await;
    harness.speech.set_failing(true).await;

    let first = harness.start_and_finish("Ancient Rome").await;
    let failed = harness.orchestrator.get(&first).unwrap().unwrap();
    assert_eq!(failed.status, RunStatus::Error);
    assert_eq!(failed.error.as_deref(), Some(VOICE_FAILED));

    harness.speech.set_failing(false).await;
    let second = harness.start_and_finish("Ancient Rome").await;

    assert_eq!(first, second);
    let resumed = harness.orchestrator.get(&second).unwrap().unwrap();
    assert_eq!(resumed.status, RunStatus::PendingApproval);
    assert!(resumed.error.is_none());
    assert_eq!(harness.drafter.call_count().await, 1);
    assert_eq!(harness.orchestrator.count(&RunFilter::new()).unwrap(), 1);
}

#[tokio::test]
async fn test_new_topic_creates_new_run() {
    let harness = TestHarness::new().await;

    let first = harness.start_and_finish("Volcanoes").await;
    let second = harness.start_and_finish("Glaciers").await;

    assert_ne!(first, second);
    let runs = harness.orchestrator.list(&RunFilter::new()).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, second);
}

#[tokio::test]
async fn test_status_counts_runs() {
    let harness = TestHarness::new().await;
    let run_id = harness.start_and_finish("Volcanoes").await;
    harness
        .orchestrator
        .approve(&run_id, ApprovalAction::Reject)
        .await
        .unwrap();
    harness.start_and_finish("Glaciers").await;

    let status = harness.orchestrator.status().await;

    assert_eq!(status.active_runs, 0);
    assert_eq!(status.runs_by_status.get("REJECTED"), Some(&1));
    assert_eq!(status.runs_by_status.get("PENDING_APPROVAL"), Some(&1));
}

#[tokio::test]
async fn test_resume_keeps_stored_options() {
    let harness = TestHarness::new().await;
    harness.speech.set_failing(true).await;
    let first = harness
        .orchestrator
        .start(StartRunRequest::new("Ancient Rome").with_tone("Playful"))
        .await
        .unwrap();
    harness.wait_idle(&first).await;

    harness.speech.set_failing(false).await;
    let second = harness
        .orchestrator
        .start(StartRunRequest::new("Ancient Rome").with_tone("Epic"))
        .await
        .unwrap();
    harness.wait_idle(&second).await;

    assert_eq!(first, second);
    let record = harness.orchestrator.get(&second).unwrap().unwrap();
    assert_eq!(record.status, RunStatus::PendingApproval);
    assert_eq!(record.tone, "Playful");
}

#[tokio::test]
async fn test_concurrent_start_shares_executing_run() {
    let harness = TestHarness::new().await;

    let first = harness
        .orchestrator
        .start(StartRunRequest::new("Volcanoes"))
        .await
        .unwrap();
    let second = harness
        .orchestrator
        .start(StartRunRequest::new(" Volcanoes "))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert!(harness.orchestrator.is_active(&first).await);
    harness.wait_idle(&first).await;

    let record = harness.orchestrator.get(&first).unwrap().unwrap();
    assert_eq!(record.status, RunStatus::PendingApproval);
    assert_eq!(harness.drafter.call_count().await, 1);
    assert_eq!(harness.orchestrator.count(&RunFilter::new()).unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_resubmit_while_failure_is_recorded_resumes_run() {
    let harness = TestHarness::with_fail_delay(Duration::from_millis(400)).await;
    harness.speech.set_failing(true).await;

    let first = harness
        .orchestrator
        .start(StartRunRequest::new("Ancient Rome"))
        .await
        .unwrap();
    harness.wait_for_status(&first, RunStatus::Error).await;
    assert!(harness.orchestrator.is_active(&first).await);

    harness.speech.set_failing(false).await;
    let second = harness
        .orchestrator
        .start(StartRunRequest::new("Ancient Rome"))
        .await
        .unwrap();
    assert_eq!(first, second);

    harness.wait_for_status(&first, RunStatus::PendingApproval).await;
    harness.wait_idle(&first).await;
    assert_eq!(harness.speech.call_count().await, 2);
    assert_eq!(harness.orchestrator.count(&RunFilter::new()).unwrap(), 1);
}
