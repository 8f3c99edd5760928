pub mod artifacts;
pub mod assembly;
pub mod config;
pub mod content;
pub mod media;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod providers;
pub mod run;
pub mod testing;

pub use artifacts::{ArtifactIndex, ArtifactKind, ArtifactStore};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use media::{FfmpegEngine, MediaEngine};
pub use orchestrator::{
    OrchestratorError, Publisher, RunOrchestrator, StartRunRequest, StubPublisher,
};
pub use pipeline::{EngineError, PipelineEngine, RunState, StageOutcome};
pub use providers::{FallbackChain, ProviderSet};
pub use run::{ApprovalAction, RunFilter, RunRecord, RunStatus, RunStore, SqliteRunStore};
