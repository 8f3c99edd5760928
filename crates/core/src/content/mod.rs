//! Creative content model: trends, analyses, drafts and scenes.

mod narration;
mod types;

pub use narration::{
    clean_narration_text, contains_sensitive_words, desensitize_prompt, styled_scene_prompt,
};
pub use types::{
    AspectRatio, ContentDraft, Scene, ScriptAnalysis, TrendCandidate, DEFAULT_MUSIC_MOOD,
    DEFAULT_SCENE_DURATION_SECS, DEFAULT_VISUAL_STYLE,
};
