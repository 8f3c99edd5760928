//! LLM-backed script analysis.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::error::ProviderError;
use super::llm::{complete_json, CompletionRequest, LlmClient};
use super::traits::{AnalysisRequest, Provider, ScriptAnalyzer};
use crate::content::ScriptAnalysis;

const SYSTEM_PROMPT: &str = r#"You are a viral social media strategist. You analyze a topic or trending video and explain what would make a short cinematic video about it stop people from scrolling.

Respond with JSON only, no other text:
{
  "hook_technique": "string",
  "hook_variations": ["hook 1", "hook 2", "hook 3"],
  "emotional_trigger": "string",
  "structural_pattern": "string",
  "target_audience_insight": "string",
  "virality_score": 7
}

virality_score is an integer from 0 to 10."#;

#[derive(Debug, Deserialize)]
struct AnalysisReply {
    hook_technique: String,
    #[serde(default)]
    hook_variations: Vec<String>,
    emotional_trigger: String,
    #[serde(default)]
    structural_pattern: String,
    #[serde(default)]
    target_audience_insight: String,
    #[serde(default)]
    virality_score: f64,
}

/// Script analyzer that prompts one LLM.
pub struct LlmScriptAnalyzer {
    name: String,
    client: Arc<dyn LlmClient>,
}

impl LlmScriptAnalyzer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            name: format!("{}/{}", client.provider(), client.model()),
            client,
        }
    }

    fn build_user_prompt(request: &AnalysisRequest) -> String {
        format!(
            "Analyze this for a cinematic short video.\n\nContext:\n{}\n\nTarget tone: {}\nTarget platform: {}",
            request.context, request.tone, request.platform
        )
    }

    fn parse_reply(&self, reply: AnalysisReply) -> Result<ScriptAnalysis, ProviderError> {
        if reply.hook_technique.trim().is_empty() {
            return Err(ProviderError::invalid_response(&self.name, "empty hook_technique"));
        }

        let defaults = ScriptAnalysis::default();
        let mut hooks: Vec<String> = reply
            .hook_variations
            .into_iter()
            .filter(|h| !h.trim().is_empty())
            .take(3)
            .collect();
        // Top up short lists so downstream prompts always see three hooks.
        for fallback in defaults.hook_variations {
            if hooks.len() >= 3 {
                break;
            }
            hooks.push(fallback);
        }

        Ok(ScriptAnalysis {
            hook_technique: reply.hook_technique,
            hook_variations: hooks,
            emotional_trigger: reply.emotional_trigger,
            structural_pattern: reply.structural_pattern,
            target_audience_insight: reply.target_audience_insight,
            virality_score: reply.virality_score.round().clamp(0.0, 10.0) as u8,
        })
    }
}

impl Provider for LlmScriptAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ScriptAnalyzer for LlmScriptAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<ScriptAnalysis, ProviderError> {
        let completion = CompletionRequest::new(Self::build_user_prompt(request))
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(800)
            .with_temperature(0.4);

        let reply: AnalysisReply = complete_json(self.client.as_ref(), completion)
            .await
            .map_err(|e| ProviderError::failed(&self.name, e))?;
        self.parse_reply(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::tests::ScriptedLlm;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            context: "Deep sea creatures".to_string(),
            tone: "Mysterious".to_string(),
            platform: "TikTok".to_string(),
        }
    }

    #[tokio::test]
    async fn test_analyze_parses_reply() {
        let llm = Arc::new(ScriptedLlm::replying(
            r#"{
                "hook_technique": "Open loop",
                "hook_variations": ["What lives down there?", "You have never seen this.", "Darkness hides everything."],
                "emotional_trigger": "Curiosity",
                "structural_pattern": "Reveal",
                "target_audience_insight": "Nature fans",
                "virality_score": 8
            }"#,
        ));
        let analyzer = LlmScriptAnalyzer::new(llm.clone());

        let analysis = analyzer.analyze(&request()).await.unwrap();
        assert_eq!(analysis.hook_technique, "Open loop");
        assert_eq!(analysis.virality_score, 8);
        assert_eq!(analysis.hook_variations.len(), 3);

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].prompt.contains("Deep sea creatures"));
        assert!(prompts[0].prompt.contains("Mysterious"));
    }

    #[tokio::test]
    async fn test_analyze_clamps_score_and_pads_hooks() {
        let llm = Arc::new(ScriptedLlm::replying(
            r#"{"hook_technique": "Shock", "hook_variations": ["One"], "emotional_trigger": "Fear", "virality_score": 14.2}"#,
        ));
        let analyzer = LlmScriptAnalyzer::new(llm);

        let analysis = analyzer.analyze(&request()).await.unwrap();
        assert_eq!(analysis.virality_score, 10);
        assert_eq!(analysis.hook_variations.len(), 3);
        assert_eq!(analysis.hook_variations[0], "One");
    }

    #[tokio::test]
    async fn test_analyze_reports_malformed_reply() {
        let llm = Arc::new(ScriptedLlm::replying(r#"{"hook_technique": ""}"#));
        let analyzer = LlmScriptAnalyzer::new(llm);
        assert!(analyzer.analyze(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_analyze_reports_api_failure() {
        let analyzer = LlmScriptAnalyzer::new(Arc::new(ScriptedLlm::failing(529)));
        let err = analyzer.analyze(&request()).await.unwrap_err();
        assert!(err.to_string().contains("scripted/scripted-1"));
    }
}
