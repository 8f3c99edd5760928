//! Provider configuration types.

use serde::{Deserialize, Serialize};

/// LLM backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmBackend {
    /// Anthropic Claude API.
    Anthropic,
    /// Local Ollama instance.
    Ollama,
    /// OpenAI or any OpenAI-compatible chat completions endpoint.
    Openai,
    /// Google Gemini `generateContent` API.
    Gemini,
}

/// One LLM in the ordered text-generation chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    /// Model name/identifier.
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL (for proxies or self-hosted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// OpenAI credentials, used for speech and images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(default = "default_openai_base")]
    pub api_base: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
}

fn default_openai_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_tts_voice() -> String {
    "onyx".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_openai_base(),
            tts_model: default_tts_model(),
            tts_voice: default_tts_voice(),
            image_model: default_image_model(),
        }
    }
}

/// ElevenLabs credentials, used for speech and sound generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    #[serde(default = "default_elevenlabs_base")]
    pub api_base: String,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_elevenlabs_model")]
    pub model_id: String,
}

fn default_elevenlabs_base() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_voice_id() -> String {
    "pNInz6obpgDQGcFmaJgB".to_string()
}

fn default_elevenlabs_model() -> String {
    "eleven_monolingual_v1".to_string()
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_elevenlabs_base(),
            voice_id: default_voice_id(),
            model_id: default_elevenlabs_model(),
        }
    }
}

/// Google AI Studio credentials, used for Imagen image generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_gemini_base")]
    pub api_base: String,
    #[serde(default = "default_imagen_model")]
    pub image_model: String,
}

pub(crate) fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_imagen_model() -> String {
    "imagen-3.0-generate-001".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_gemini_base(),
            image_model: default_imagen_model(),
        }
    }
}

/// Local command-line speech synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeTtsConfig {
    #[serde(default = "default_edge_program")]
    pub program: String,
    #[serde(default = "default_edge_voice")]
    pub voice: String,
}

fn default_edge_program() -> String {
    "edge-tts".to_string()
}

fn default_edge_voice() -> String {
    "en-US-ChristopherNeural".to_string()
}

impl Default for EdgeTtsConfig {
    fn default() -> Self {
        Self {
            program: default_edge_program(),
            voice: default_edge_voice(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechProviderKind {
    Elevenlabs,
    Openai,
    EdgeTts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageProviderKind {
    Openai,
    Gemini,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicProviderKind {
    Elevenlabs,
    Local,
}

/// Which providers back each capability, and in what order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Ordered LLM chain for analysis, drafting and prompt sanitizing.
    #[serde(default)]
    pub llm: Vec<LlmConfig>,
    #[serde(default)]
    pub openai: Option<OpenAiConfig>,
    #[serde(default)]
    pub elevenlabs: Option<ElevenLabsConfig>,
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
    #[serde(default)]
    pub edge_tts: EdgeTtsConfig,
    /// Ordered speech chain. Providers without credentials are skipped.
    #[serde(default = "default_speech")]
    pub speech: Vec<SpeechProviderKind>,
    /// Ordered image chain. Providers without credentials are skipped.
    #[serde(default = "default_image")]
    pub image: Vec<ImageProviderKind>,
    /// Ordered music chain. Providers without credentials are skipped.
    #[serde(default = "default_music")]
    pub music: Vec<MusicProviderKind>,
    /// URLs returning JSON trend candidate lists.
    #[serde(default)]
    pub discovery_feeds: Vec<String>,
    /// Rewrite image prompts through the LLM chain before generation.
    #[serde(default = "default_sanitize_prompts")]
    pub sanitize_prompts: bool,
}

fn default_speech() -> Vec<SpeechProviderKind> {
    vec![
        SpeechProviderKind::Elevenlabs,
        SpeechProviderKind::Openai,
        SpeechProviderKind::EdgeTts,
    ]
}

fn default_image() -> Vec<ImageProviderKind> {
    vec![ImageProviderKind::Openai, ImageProviderKind::Gemini]
}

fn default_music() -> Vec<MusicProviderKind> {
    vec![MusicProviderKind::Elevenlabs, MusicProviderKind::Local]
}

fn default_sanitize_prompts() -> bool {
    true
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            llm: Vec::new(),
            openai: None,
            elevenlabs: None,
            gemini: None,
            edge_tts: EdgeTtsConfig::default(),
            speech: default_speech(),
            image: default_image(),
            music: default_music(),
            discovery_feeds: Vec::new(),
            sanitize_prompts: default_sanitize_prompts(),
        }
    }
}
