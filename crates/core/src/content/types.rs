//! Structured creative content flowing through the pipeline.

use serde::{Deserialize, Serialize};

/// Default duration of a scene in seconds.
pub const DEFAULT_SCENE_DURATION_SECS: f64 = 5.0;

/// Default style descriptor appended to every scene prompt.
pub const DEFAULT_VISUAL_STYLE: &str = "Cinematic, high-definition, photorealistic, 8k.";

/// Default mood used when generating background music.
pub const DEFAULT_MUSIC_MOOD: &str = "Ambient, cinematic background music";

/// One discovered trend used as creative context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendCandidate {
    /// Identifier on the originating platform.
    pub source_id: String,
    pub description: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub music_id: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub author: String,
    pub url: String,
}

impl TrendCandidate {
    /// Text handed to providers as the creative seed.
    pub fn as_prompt_context(&self) -> String {
        let mut context = self.description.clone();
        if !self.hashtags.is_empty() {
            context.push_str("\nHashtags: ");
            context.push_str(&self.hashtags.join(" "));
        }
        if let Some(ref transcript) = self.transcript {
            context.push_str("\nTranscript: ");
            context.push_str(transcript);
        }
        context
    }
}

/// Breakdown of why a piece of content works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptAnalysis {
    pub hook_technique: String,
    pub hook_variations: Vec<String>,
    pub emotional_trigger: String,
    pub structural_pattern: String,
    pub target_audience_insight: String,
    /// 0 to 10.
    pub virality_score: u8,
}

impl Default for ScriptAnalysis {
    fn default() -> Self {
        Self {
            hook_technique: "Cinematic Storytelling".to_string(),
            hook_variations: vec![
                "What if everything you knew was about to change?".to_string(),
                "Nobody is talking about this.".to_string(),
                "Watch until the end.".to_string(),
            ],
            emotional_trigger: "Awe".to_string(),
            structural_pattern: "Hero's Journey".to_string(),
            target_audience_insight: "General audience".to_string(),
            virality_score: 5,
        }
    }
}

/// Frame shape requested for a scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Vertical,
}

impl AspectRatio {
    /// Parse a "W:H" tag, returning `None` for anything unsupported.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim() {
            "9:16" => Some(Self::Portrait),
            "16:9" => Some(Self::Landscape),
            "1:1" => Some(Self::Square),
            "4:5" => Some(Self::Vertical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "9:16",
            Self::Landscape => "16:9",
            Self::Square => "1:1",
            Self::Vertical => "4:5",
        }
    }

    /// Width over height.
    pub fn ratio(&self) -> f64 {
        match self {
            Self::Portrait => 9.0 / 16.0,
            Self::Landscape => 16.0 / 9.0,
            Self::Square => 1.0,
            Self::Vertical => 4.0 / 5.0,
        }
    }

    /// Full-resolution frame size for a rendered clip.
    pub fn clip_size(&self) -> (u32, u32) {
        match self {
            Self::Portrait => (1080, 1920),
            Self::Landscape => (1920, 1080),
            Self::Square => (1080, 1080),
            Self::Vertical => (1080, 1350),
        }
    }
}

/// One planned shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub prompt: String,
    #[serde(default = "default_scene_duration")]
    pub duration_secs: f64,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

fn default_scene_duration() -> f64 {
    DEFAULT_SCENE_DURATION_SECS
}

impl Scene {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            duration_secs: DEFAULT_SCENE_DURATION_SECS,
            aspect_ratio: AspectRatio::default(),
        }
    }

    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }
}

/// Everything needed to produce the video: narration, captions, and shot list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDraft {
    pub title: String,
    pub script: String,
    #[serde(default)]
    pub hook_selected: String,
    #[serde(default)]
    pub emotional_payoff: String,
    pub caption: String,
    /// Primary visual prompt, used when the scene list is empty.
    pub visual_prompt: String,
    #[serde(default = "default_visual_style")]
    pub visual_style: String,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default = "default_music_mood")]
    pub music_mood: String,
    #[serde(default = "default_is_aigc")]
    pub is_aigc: bool,
}

fn default_visual_style() -> String {
    DEFAULT_VISUAL_STYLE.to_string()
}

fn default_music_mood() -> String {
    DEFAULT_MUSIC_MOOD.to_string()
}

fn default_is_aigc() -> bool {
    true
}

impl ContentDraft {
    /// Placeholder returned when drafting produced nothing usable.
    pub fn error_placeholder() -> Self {
        Self {
            title: "Error Generating Content".to_string(),
            script: "Error".to_string(),
            hook_selected: String::new(),
            emotional_payoff: String::new(),
            caption: "Error".to_string(),
            visual_prompt: "Error".to_string(),
            visual_style: "Standard".to_string(),
            scenes: Vec::new(),
            music_mood: default_music_mood(),
            is_aigc: true,
        }
    }

    /// A draft without scenes cannot be animated as planned and gets redrafted on resume.
    pub fn has_scenes(&self) -> bool {
        !self.scenes.is_empty()
    }

    /// Scenes to render, substituting a single synthetic scene when the list is empty.
    pub fn effective_scenes(&self) -> Vec<Scene> {
        if self.scenes.is_empty() {
            vec![Scene::new(self.visual_prompt.clone())]
        } else {
            self.scenes.clone()
        }
    }

    /// Sum of the planned scene durations.
    pub fn total_scene_duration(&self) -> f64 {
        self.effective_scenes().iter().map(|s| s.duration_secs).sum()
    }
}
