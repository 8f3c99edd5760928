//! LLM-backed image prompt rewriting.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::error::ProviderError;
use super::llm::{complete_json, CompletionRequest, LlmClient};
use super::traits::{PromptSanitizer, Provider};

const SYSTEM_PROMPT: &str = r#"You are a cinematic prompt engineer for photorealistic image generation.
Rewrite the prompt so image safety filters accept it while keeping its emotional power:
- Replace graphic violence with heroic struggle or intense drama.
- Replace gore with dramatic lighting or intense atmosphere.
- Keep it descriptive: camera angle, lighting, textures.

Respond with JSON only: {"prompt": "rewritten prompt"}"#;

#[derive(Debug, Deserialize)]
struct SanitizedReply {
    prompt: String,
}

pub struct LlmPromptSanitizer {
    name: String,
    client: Arc<dyn LlmClient>,
}

impl LlmPromptSanitizer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            name: format!("{}/{}", client.provider(), client.model()),
            client,
        }
    }
}

impl Provider for LlmPromptSanitizer {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl PromptSanitizer for LlmPromptSanitizer {
    async fn sanitize(&self, prompt: &str) -> Result<String, ProviderError> {
        let completion = CompletionRequest::new(format!("Original prompt: {}", prompt))
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(400)
            .with_temperature(0.3);

        let reply: SanitizedReply = complete_json(self.client.as_ref(), completion)
            .await
            .map_err(|e| ProviderError::failed(&self.name, e))?;

        let rewritten = reply.prompt.trim();
        if rewritten.is_empty() {
            return Err(ProviderError::invalid_response(&self.name, "empty prompt"));
        }
        Ok(rewritten.to_string())
    }
}
