//! Run storage trait and types.

use thiserror::Error;

use super::{RunRecord, RunStatus};
use crate::content::{ContentDraft, ScriptAnalysis};

/// Error type for run record operations.
#[derive(Debug, Error)]
pub enum RunError {
    /// Run not found.
    #[error("Run not found: {0}")]
    NotFound(String),

    /// Cannot perform operation due to current status.
    #[error("Cannot {operation} run {run_id}: current status is {current_status}")]
    InvalidState {
        run_id: String,
        current_status: RunStatus,
        operation: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl RunError {
    pub(crate) fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

/// Request to create a new run.
#[derive(Debug, Clone)]
pub struct CreateRunRequest {
    pub topic: String,
    pub tone: String,
    pub duration_secs: u32,
    pub platform: String,
    pub use_captions: bool,
}

/// A single persisted field written by a stage.
#[derive(Debug, Clone)]
pub enum RunField {
    TrendSourceUrl(Option<String>),
    Analysis(ScriptAnalysis),
    Draft(ContentDraft),
    VoiceUrl(String),
    MusicUrl(String),
    VideoUrl(String),
}

/// Filter for querying runs.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    /// Filter by status.
    pub status: Option<RunStatus>,
    /// Filter by exact topic.
    pub topic: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl RunFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            topic: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: RunStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for run storage backends.
///
/// Stored analyses and drafts are decoded here and nowhere else: callers
/// always receive typed values, and a value that no longer decodes is
/// reported as absent.
pub trait RunStore: Send + Sync {
    /// Create a new run in `INITIALIZING` with progress 0.
    fn create(&self, request: CreateRunRequest) -> Result<RunRecord, RunError>;

    /// Get a run by ID.
    fn get(&self, id: &str) -> Result<Option<RunRecord>, RunError>;

    /// List runs matching the filter, newest first.
    fn list(&self, filter: &RunFilter) -> Result<Vec<RunRecord>, RunError>;

    /// Count runs matching the filter.
    fn count(&self, filter: &RunFilter) -> Result<i64, RunError>;

    /// Most recent `ERROR` run for a topic, if any.
    fn find_latest_failed_by_topic(&self, topic: &str) -> Result<Option<RunRecord>, RunError>;

    /// Start a fresh attempt on an existing run: `INITIALIZING`, progress 0, error cleared.
    /// Produced analysis, draft and artifact URLs are kept.
    fn begin_attempt(&self, id: &str) -> Result<RunRecord, RunError>;

    /// Set status and raise progress. Progress never decreases.
    fn update_progress(
        &self,
        id: &str,
        status: RunStatus,
        progress: u8,
    ) -> Result<RunRecord, RunError>;

    /// Persist one stage output.
    fn update_field(&self, id: &str, field: RunField) -> Result<(), RunError>;

    /// Mark the run as failed with a terminal message.
    fn fail(&self, id: &str, error: &str) -> Result<RunRecord, RunError>;

    /// Move from `expected` to `next`, failing if the run is in any other status.
    fn transition(
        &self,
        id: &str,
        expected: RunStatus,
        next: RunStatus,
        operation: &str,
    ) -> Result<RunRecord, RunError>;

    /// Permanently delete a run. Returns the deleted run if found.
    fn delete(&self, id: &str) -> Result<RunRecord, RunError>;
}
