//! LLM-backed content drafting.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::error::ProviderError;
use super::llm::{complete_json, CompletionRequest, LlmClient};
use super::traits::{ContentDrafter, DraftRequest, Provider};
use crate::content::{
    AspectRatio, ContentDraft, Scene, DEFAULT_MUSIC_MOOD, DEFAULT_SCENE_DURATION_SECS,
    DEFAULT_VISUAL_STYLE,
};

const SYSTEM_PROMPT: &str = r#"You are a cinematic creative director writing short-form videos.

Tasks:
1. Write a voiceover script that can be read aloud in the requested duration.
2. Plan the scenes as image prompts with character actions and camera movement.
3. Define one visual style description that keeps every scene consistent.

Respond with JSON only, no other text:
{
  "title": "string",
  "script": "string",
  "hook_selected": "string",
  "emotional_payoff": "string",
  "caption": "string",
  "visual_style_description": "string",
  "visual_prompt": "string",
  "music_mood_prompt": "string",
  "visual_scenes": [
    { "prompt": "string", "duration": 5.0, "aspect_ratio": "9:16" }
  ]
}"#;

#[derive(Debug, Deserialize)]
struct DraftReply {
    title: Option<String>,
    script: String,
    #[serde(default)]
    hook_selected: String,
    #[serde(default)]
    emotional_payoff: String,
    #[serde(default)]
    caption: String,
    visual_style_description: Option<String>,
    #[serde(default)]
    visual_prompt: String,
    music_mood_prompt: Option<String>,
    #[serde(default)]
    visual_scenes: Vec<SceneReply>,
}

#[derive(Debug, Deserialize)]
struct SceneReply {
    prompt: String,
    duration: Option<f64>,
    aspect_ratio: Option<String>,
}

fn non_empty(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Content drafter that prompts one LLM.
pub struct LlmContentDrafter {
    name: String,
    client: Arc<dyn LlmClient>,
}

impl LlmContentDrafter {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            name: format!("{}/{}", client.provider(), client.model()),
            client,
        }
    }

    fn build_user_prompt(request: &DraftRequest) -> String {
        let analysis = &request.analysis;
        format!(
            "Trend context:\n{}\n\nStrategy: hook technique \"{}\", emotional trigger \"{}\", structure \"{}\".\nCandidate hooks: {}\n\nTone: {}\nDuration: {}s\nPlatform: {}",
            request.context,
            analysis.hook_technique,
            analysis.emotional_trigger,
            analysis.structural_pattern,
            analysis.hook_variations.join(" | "),
            request.tone,
            request.duration_secs,
            request.platform
        )
    }

    fn parse_reply(&self, reply: DraftReply) -> Result<ContentDraft, ProviderError> {
        if reply.script.trim().is_empty() {
            return Err(ProviderError::invalid_response(&self.name, "empty script"));
        }

        let scenes = reply
            .visual_scenes
            .into_iter()
            .filter(|s| !s.prompt.trim().is_empty())
            .map(|s| {
                let duration = s
                    .duration
                    .filter(|d| d.is_finite() && *d > 0.0)
                    .unwrap_or(DEFAULT_SCENE_DURATION_SECS);
                let aspect_ratio = s
                    .aspect_ratio
                    .as_deref()
                    .and_then(AspectRatio::parse)
                    .unwrap_or_default();
                Scene::new(s.prompt)
                    .with_duration(duration)
                    .with_aspect_ratio(aspect_ratio)
            })
            .collect();

        Ok(ContentDraft {
            title: non_empty(reply.title, "Untitled"),
            script: reply.script,
            hook_selected: reply.hook_selected,
            emotional_payoff: reply.emotional_payoff,
            caption: reply.caption,
            visual_prompt: reply.visual_prompt,
            visual_style: non_empty(reply.visual_style_description, DEFAULT_VISUAL_STYLE),
            scenes,
            music_mood: non_empty(reply.music_mood_prompt, DEFAULT_MUSIC_MOOD),
            is_aigc: true,
        })
    }
}

impl Provider for LlmContentDrafter {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ContentDrafter for LlmContentDrafter {
    async fn draft(&self, request: &DraftRequest) -> Result<ContentDraft, ProviderError> {
        let completion = CompletionRequest::new(Self::build_user_prompt(request))
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(2048)
            .with_temperature(0.8);

        let reply: DraftReply = complete_json(self.client.as_ref(), completion)
            .await
            .map_err(|e| ProviderError::failed(&self.name, e))?;
        self.parse_reply(reply)
    }
}
