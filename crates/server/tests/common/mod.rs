//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock providers injected, enabling end-to-end run lifecycle tests
//! without external services or ffmpeg.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use reelsmith_core::{
    media::MediaEngine,
    orchestrator::OrchestratorConfig,
    providers::PanZoomAnimator,
    testing::{
        MockContentDrafter, MockImageSynthesizer, MockMediaEngine, MockMusicSynthesizer,
        MockPublisher, MockScriptAnalyzer, MockSpeechSynthesizer,
    },
    ArtifactIndex, ArtifactStore, Config, FallbackChain, PipelineEngine, ProviderSet,
    RunOrchestrator, RunStore, SqliteRunStore,
};
use reelsmith_server::{api::create_router, state::AppState};

/// Test fixture for API testing with mock providers.
///
/// Provides an in-process server whose pipeline runs entirely on mocks:
/// - Speech, image and music synthesis
/// - Media rendering (every probe reports [`VOICE_SECS`])
/// - Publishing
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_start_run() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/runs", json!({ "topic": "Volcanoes" })).await;
///
///     assert_eq!(response.status, StatusCode::ACCEPTED);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock speech synthesizer - toggle failures to fail runs at the voice stage
    pub speech: Arc<MockSpeechSynthesizer>,
    /// Mock publisher - inspect published runs
    pub publisher: Arc<MockPublisher>,
    /// The orchestrator behind the router
    pub orchestrator: Arc<RunOrchestrator>,
    /// Temporary directory for the database and artifacts
    pub temp_dir: TempDir,
}

/// Duration every mocked probe reports.
pub const VOICE_SECS: f64 = 8.0;

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.database.path = temp_dir.path().join("test.db");
        config.storage.artifact_dir = temp_dir.path().join("assets");

        let store: Arc<dyn RunStore> = Arc::new(
            SqliteRunStore::new(&config.database.path).expect("Failed to create run store"),
        );
        let artifacts = Arc::new(ArtifactIndex::new(Arc::new(ArtifactStore::new(
            config.storage.artifact_dir.clone(),
            config.storage.public_base.clone(),
        ))));

        let media = Arc::new(MockMediaEngine::new());
        media.set_default_duration(VOICE_SECS).await;
        let speech = Arc::new(MockSpeechSynthesizer::new());

        let mut providers = ProviderSet::empty();
        providers.analyzer =
            FallbackChain::new("analysis", vec![Arc::new(MockScriptAnalyzer::new()) as _]);
        providers.drafter =
            FallbackChain::new("drafting", vec![Arc::new(MockContentDrafter::new()) as _]);
        providers.speech = FallbackChain::new("speech", vec![speech.clone() as _]);
        providers.image =
            FallbackChain::new("image", vec![Arc::new(MockImageSynthesizer::new()) as _]);
        providers.video = FallbackChain::new(
            "video",
            vec![Arc::new(PanZoomAnimator::new(
                media.clone() as Arc<dyn MediaEngine>,
                config.engine.fps,
            )) as _],
        );
        providers.music =
            FallbackChain::new("music", vec![Arc::new(MockMusicSynthesizer::new()) as _]);

        let engine = Arc::new(PipelineEngine::new(
            config.engine.clone(),
            Arc::clone(&store),
            providers,
            artifacts,
            media as Arc<dyn MediaEngine>,
        ));

        let publisher = Arc::new(MockPublisher::new());
        let orchestrator = Arc::new(RunOrchestrator::new(
            OrchestratorConfig::default(),
            store,
            engine,
            publisher.clone(),
        ));

        let state = Arc::new(AppState::new(config, Arc::clone(&orchestrator)));
        let router = create_router(state);

        Self {
            router,
            speech,
            publisher,
            orchestrator,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes) = self.send(request).await;
        TestResponse {
            status,
            body: parse_json(&bytes),
        }
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Start a run and wait for its engine to stop at the given status.
    pub async fn start_run(&self, topic: &str, status: &str) -> String {
        let response = self
            .post("/api/v1/runs", serde_json::json!({ "topic": topic }))
            .await;
        assert_eq!(response.status, StatusCode::ACCEPTED, "{}", response.body);
        let run_id = response.body["run_id"]
            .as_str()
            .expect("run_id in response")
            .to_string();
        self.wait_for_status(&run_id, status).await;
        self.wait_idle(&run_id).await;
        run_id
    }

    /// Wait for the engine task of a run to finish.
    pub async fn wait_idle(&self, run_id: &str) {
        for _ in 0..300 {
            if !self.orchestrator.is_active(run_id).await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run {} still executing", run_id);
    }

    /// Poll a run until it reaches the given status.
    pub async fn wait_for_status(&self, run_id: &str, status: &str) -> Value {
        let path = format!("/api/v1/runs/{}", run_id);
        let mut last = Value::Null;
        for _ in 0..300 {
            let response = self.get(&path).await;
            if response.body["status"] == status {
                return response.body;
            }
            last = response.body;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run {} never reached {}: {}", run_id, status, last);
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        let (status, bytes) = self.send(request).await;

        TestResponse {
            status,
            body: parse_json(&bytes),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, body_bytes.to_vec())
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
