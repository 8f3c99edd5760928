//! Types for the run orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::run::{RunError, RunStatus};

/// Shortest and longest accepted target duration (seconds).
pub const MIN_DURATION_SECS: u32 = 5;
pub const MAX_DURATION_SECS: u32 = 600;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Request rejected before anything was stored.
    #[error("{0}")]
    Validation(String),

    /// Run not found.
    #[error("run not found: {0}")]
    NotFound(String),

    /// The run is not in the status the operation needs.
    #[error("cannot {operation} run {run_id}: current status is {current}")]
    InvalidState {
        run_id: String,
        current: RunStatus,
        operation: String,
    },

    /// Run store error.
    #[error("run store error: {0}")]
    Store(RunError),
}

impl From<RunError> for OrchestratorError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::NotFound(id) => OrchestratorError::NotFound(id),
            RunError::InvalidState {
                run_id,
                current_status,
                operation,
            } => OrchestratorError::InvalidState {
                run_id,
                current: current_status,
                operation,
            },
            other => OrchestratorError::Store(other),
        }
    }
}

/// Parameters of a new run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRunRequest {
    pub topic: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_duration", alias = "duration")]
    pub duration_secs: u32,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_use_captions")]
    pub use_captions: bool,
}

fn default_tone() -> String {
    "Professional".to_string()
}

fn default_duration() -> u32 {
    60
}

fn default_platform() -> String {
    "TikTok".to_string()
}

fn default_use_captions() -> bool {
    true
}

impl StartRunRequest {
    /// A request for `topic` with every other field at its default.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            tone: default_tone(),
            duration_secs: default_duration(),
            platform: default_platform(),
            use_captions: default_use_captions(),
        }
    }

    pub fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.topic.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "topic cannot be empty".to_string(),
            ));
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.duration_secs) {
            return Err(OrchestratorError::Validation(format!(
                "duration must be between {} and {} seconds",
                MIN_DURATION_SECS, MAX_DURATION_SECS
            )));
        }
        Ok(())
    }
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Runs with an engine currently executing in this process.
    pub active_runs: usize,
    /// Stored runs per status.
    pub runs_by_status: BTreeMap<String, i64>,
}
