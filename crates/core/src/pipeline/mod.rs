//! The five-stage generation pipeline.
//!
//! Stages run strictly in order: discovery, analysis, drafting, voice, then
//! animation with assembly. Each stage first checks whether its output
//! already exists (in the run record or the artifact index) so a failed run
//! can be resumed without redoing completed work.

mod analysis;
mod animation;
mod config;
mod discovery;
mod drafting;
mod engine;
mod stage;
mod state;
mod voice;

pub use analysis::AnalysisStage;
pub use animation::{scene_progress, AnimationStage, ASSEMBLY_FAILED, SCENES_FAILED};
pub use config::EngineConfig;
pub use discovery::{dedup_candidates, DiscoveryStage};
pub use drafting::DraftingStage;
pub use engine::{EngineError, PipelineEngine};
pub use stage::{Stage, StageContext};
pub use state::{RunState, StageOutcome};
pub use voice::{VoiceStage, VOICE_FAILED};
