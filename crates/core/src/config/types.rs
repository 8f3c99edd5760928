use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::media::MediaConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::pipeline::EngineConfig;
use crate::providers::{
    ImageProviderKind, LlmBackend, MusicProviderKind, ProvidersConfig, SpeechProviderKind,
};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reelsmith.db")
}

/// Where generated artifacts live and how they are addressed publicly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding every generated artifact.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// URL prefix under which the artifact directory is served.
    #[serde(default = "default_public_base")]
    pub public_base: String,
    /// Directory of pre-supplied background tracks (*.mp3, *.wav).
    #[serde(default = "default_music_library_dir")]
    pub music_library_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            public_base: default_public_base(),
            music_library_dir: default_music_library_dir(),
        }
    }
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_public_base() -> String {
    "/assets".to_string()
}

fn default_music_library_dir() -> PathBuf {
    PathBuf::from("local_assets/music")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub engine: EngineConfig,
    pub media: MediaConfig,
    pub orchestrator: OrchestratorConfig,
    pub providers: SanitizedProvidersConfig,
}

/// Provider settings with API keys replaced by presence flags.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProvidersConfig {
    pub llm: Vec<SanitizedLlmConfig>,
    pub openai_configured: bool,
    pub elevenlabs_configured: bool,
    pub gemini_configured: bool,
    pub speech: Vec<SpeechProviderKind>,
    pub image: Vec<ImageProviderKind>,
    pub music: Vec<MusicProviderKind>,
    pub discovery_feeds: usize,
    pub sanitize_prompts: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLlmConfig {
    pub backend: LlmBackend,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let providers = &config.providers;
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            storage: config.storage.clone(),
            engine: config.engine.clone(),
            media: config.media.clone(),
            orchestrator: config.orchestrator.clone(),
            providers: SanitizedProvidersConfig {
                llm: providers
                    .llm
                    .iter()
                    .map(|llm| SanitizedLlmConfig {
                        backend: llm.backend,
                        model: llm.model.clone(),
                        api_base: llm.api_base.clone(),
                        api_key_configured: llm.api_key.is_some(),
                    })
                    .collect(),
                openai_configured: providers.openai.is_some(),
                elevenlabs_configured: providers.elevenlabs.is_some(),
                gemini_configured: providers.gemini.is_some(),
                speech: providers.speech.clone(),
                image: providers.image.clone(),
                music: providers.music.clone(),
                discovery_feeds: providers.discovery_feeds.len(),
                sanitize_prompts: providers.sanitize_prompts,
            },
        }
    }
}
