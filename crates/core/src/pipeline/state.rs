//! In-memory working state of one pipeline execution.

use crate::artifacts::ArtifactHandle;
use crate::content::{ContentDraft, ScriptAnalysis, TrendCandidate};
use crate::run::RunRecord;

/// Fields are filled in pipeline order: a draft implies an analysis, and a
/// final video implies a voice track.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub run_id: String,
    pub topic: String,
    pub tone: String,
    pub duration_secs: u32,
    pub platform: String,
    pub use_captions: bool,
    pub candidates: Vec<TrendCandidate>,
    pub selected_trend: Option<TrendCandidate>,
    pub analysis: Option<ScriptAnalysis>,
    pub draft: Option<ContentDraft>,
    pub voice: Option<ArtifactHandle>,
    pub music: Option<ArtifactHandle>,
    pub final_video: Option<ArtifactHandle>,
    /// Clips that survived animation, in scene order.
    pub scene_clips: Vec<ArtifactHandle>,
    pub error: Option<String>,
}

impl RunState {
    /// Seed a state from the persisted record, carrying over resumable outputs.
    pub fn from_record(record: &RunRecord) -> Self {
        Self {
            run_id: record.id.clone(),
            topic: record.topic.clone(),
            tone: record.tone.clone(),
            duration_secs: record.duration_secs,
            platform: record.platform.clone(),
            use_captions: record.use_captions,
            candidates: Vec::new(),
            selected_trend: None,
            analysis: record.analysis.clone(),
            draft: record.draft.clone(),
            voice: None,
            music: None,
            final_video: None,
            scene_clips: Vec::new(),
            error: None,
        }
    }

    /// Creative seed for the text providers: the selected trend, or the bare topic.
    pub fn creative_context(&self) -> String {
        match &self.selected_trend {
            Some(trend) => trend.as_prompt_context(),
            None => self.topic.clone(),
        }
    }

    pub fn video_url(&self) -> Option<&str> {
        self.final_video.as_ref().map(|h| h.url.as_str())
    }
}

/// How a stage ended. Stages report failure through `Fatal`, never `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    /// Earlier output was reused and no provider was called.
    Resumed,
    Fatal(String),
}

impl StageOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            StageOutcome::Completed => "completed",
            StageOutcome::Resumed => "resumed",
            StageOutcome::Fatal(_) => "fatal",
        }
    }
}
