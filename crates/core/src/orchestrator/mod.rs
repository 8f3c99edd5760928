//! Run orchestration: the service facade used by the HTTP layer.
//!
//! - **start**: validates, creates or resumes a run, spawns the pipeline engine
//! - **approve**: moves a finished run to review outcome and publishes in the background
//! - **get / list / count / delete**: thin pass-throughs to the run store

mod config;
mod publisher;
mod service;
mod types;

pub use config::OrchestratorConfig;
pub use publisher::{PublishError, Publisher, StubPublisher};
pub use service::RunOrchestrator;
pub use types::{
    OrchestratorError, OrchestratorStatus, StartRunRequest, MAX_DURATION_SECS, MIN_DURATION_SECS,
};
