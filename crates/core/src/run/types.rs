//! Core run data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::content::{ContentDraft, ScriptAnalysis};

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Initializing,
    Searching,
    Analyzing,
    Generating,
    Voice,
    Animation,
    PendingApproval,
    Approved,
    Published,
    Rejected,
    Error,
}

impl RunStatus {
    pub const ALL: [RunStatus; 11] = [
        RunStatus::Initializing,
        RunStatus::Searching,
        RunStatus::Analyzing,
        RunStatus::Generating,
        RunStatus::Voice,
        RunStatus::Animation,
        RunStatus::PendingApproval,
        RunStatus::Approved,
        RunStatus::Published,
        RunStatus::Rejected,
        RunStatus::Error,
    ];

    /// Storage and API representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Initializing => "INITIALIZING",
            RunStatus::Searching => "SEARCHING",
            RunStatus::Analyzing => "ANALYZING",
            RunStatus::Generating => "GENERATING",
            RunStatus::Voice => "VOICE",
            RunStatus::Animation => "ANIMATION",
            RunStatus::PendingApproval => "PENDING_APPROVAL",
            RunStatus::Approved => "APPROVED",
            RunStatus::Published => "PUBLISHED",
            RunStatus::Rejected => "REJECTED",
            RunStatus::Error => "ERROR",
        }
    }

    /// Returns true while the pipeline engine owns the run.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            RunStatus::Initializing
                | RunStatus::Searching
                | RunStatus::Analyzing
                | RunStatus::Generating
                | RunStatus::Voice
                | RunStatus::Animation
        )
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Published | RunStatus::Rejected)
    }

    /// Only failed runs may be picked up again by topic.
    pub fn is_resumable(&self) -> bool {
        matches!(self, RunStatus::Error)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        RunStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| format!("unknown run status: {}", s))
    }
}

/// Reviewer decision on a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Approve,
    Reject,
}

/// Durable representation of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub topic: String,
    pub tone: String,
    pub duration_secs: u32,
    pub platform: String,
    pub use_captions: bool,
    pub trend_source_url: Option<String>,
    pub status: RunStatus,
    /// 0 to 100, never decreasing within an attempt.
    pub progress: u8,
    pub analysis: Option<ScriptAnalysis>,
    pub draft: Option<ContentDraft>,
    pub voice_url: Option<String>,
    pub music_url: Option<String>,
    pub video_url: Option<String>,
    /// Message of the stage-fatal error that ended the last attempt.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
