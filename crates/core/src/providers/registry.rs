//! Assembles the configured providers into fallback chains.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::analyzer::LlmScriptAnalyzer;
use super::chain::FallbackChain;
use super::config::{ImageProviderKind, MusicProviderKind, SpeechProviderKind};
use super::discovery::{FeedTrendSource, TopicTrendSource};
use super::drafter::LlmContentDrafter;
use super::image::{GeminiImageSynthesizer, OpenAiImageSynthesizer};
use super::llm::{build_client, LlmClient};
use super::music::{ElevenLabsMusic, LocalMusicLibrary};
use super::sanitizer::LlmPromptSanitizer;
use super::speech::{EdgeTtsSpeech, ElevenLabsSpeech, OpenAiSpeech};
use super::traits::{
    ContentDrafter, ImageSynthesizer, MusicSynthesizer, PromptSanitizer, ScriptAnalyzer,
    SpeechSynthesizer, TrendSource, VideoSynthesizer,
};
use super::video::PanZoomAnimator;
use crate::config::Config;
use crate::media::MediaEngine;

const LLM_TIMEOUT: Duration = Duration::from_secs(120);
const SPEECH_TIMEOUT: Duration = Duration::from_secs(120);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(180);
const MUSIC_TIMEOUT: Duration = Duration::from_secs(120);

/// Every capability the pipeline calls, each as an ordered chain.
#[derive(Clone)]
pub struct ProviderSet {
    pub analyzer: FallbackChain<dyn ScriptAnalyzer>,
    pub drafter: FallbackChain<dyn ContentDrafter>,
    pub speech: FallbackChain<dyn SpeechSynthesizer>,
    pub image: FallbackChain<dyn ImageSynthesizer>,
    pub video: FallbackChain<dyn VideoSynthesizer>,
    pub music: FallbackChain<dyn MusicSynthesizer>,
    /// Absent when prompt rewriting is disabled.
    pub sanitizer: Option<FallbackChain<dyn PromptSanitizer>>,
    /// Queried concurrently during discovery.
    pub trend_sources: Vec<Arc<dyn TrendSource>>,
}

impl ProviderSet {
    /// A set where every chain is empty.
    pub fn empty() -> Self {
        Self {
            analyzer: FallbackChain::empty("analysis"),
            drafter: FallbackChain::empty("drafting"),
            speech: FallbackChain::empty("speech"),
            image: FallbackChain::empty("image"),
            video: FallbackChain::empty("video"),
            music: FallbackChain::empty("music"),
            sanitizer: None,
            trend_sources: Vec::new(),
        }
    }

    /// Build the production providers. Entries lacking credentials are skipped.
    pub fn from_config(config: &Config, media: Arc<dyn MediaEngine>) -> Self {
        let providers = &config.providers;

        let llms: Vec<Arc<dyn LlmClient>> = providers
            .llm
            .iter()
            .filter_map(|entry| match build_client(entry, LLM_TIMEOUT) {
                Ok(client) => Some(Arc::from(client)),
                Err(e) => {
                    warn!("Skipping LLM {:?}/{}: {}", entry.backend, entry.model, e);
                    None
                }
            })
            .collect();

        let analyzers: Vec<Arc<dyn ScriptAnalyzer>> = llms
            .iter()
            .map(|c| Arc::new(LlmScriptAnalyzer::new(Arc::clone(c))) as Arc<dyn ScriptAnalyzer>)
            .collect();
        let drafters: Vec<Arc<dyn ContentDrafter>> = llms
            .iter()
            .map(|c| Arc::new(LlmContentDrafter::new(Arc::clone(c))) as Arc<dyn ContentDrafter>)
            .collect();
        let sanitizer = providers.sanitize_prompts.then(|| {
            FallbackChain::new(
                "sanitize",
                llms.iter()
                    .map(|c| {
                        Arc::new(LlmPromptSanitizer::new(Arc::clone(c))) as Arc<dyn PromptSanitizer>
                    })
                    .collect(),
            )
        });

        let mut speech: Vec<Arc<dyn SpeechSynthesizer>> = Vec::new();
        for kind in &providers.speech {
            match kind {
                SpeechProviderKind::Elevenlabs => match &providers.elevenlabs {
                    Some(cfg) if !cfg.api_key.is_empty() => {
                        speech.push(Arc::new(ElevenLabsSpeech::new(cfg.clone(), SPEECH_TIMEOUT)))
                    }
                    _ => warn!("Skipping elevenlabs speech: no api key"),
                },
                SpeechProviderKind::Openai => match &providers.openai {
                    Some(cfg) if !cfg.api_key.is_empty() => {
                        speech.push(Arc::new(OpenAiSpeech::new(cfg.clone(), SPEECH_TIMEOUT)))
                    }
                    _ => warn!("Skipping openai speech: no api key"),
                },
                SpeechProviderKind::EdgeTts => speech.push(Arc::new(EdgeTtsSpeech::new(
                    providers.edge_tts.clone(),
                    SPEECH_TIMEOUT,
                ))),
            }
        }

        let mut image: Vec<Arc<dyn ImageSynthesizer>> = Vec::new();
        for kind in &providers.image {
            match kind {
                ImageProviderKind::Openai => match &providers.openai {
                    Some(cfg) if !cfg.api_key.is_empty() => image.push(Arc::new(
                        OpenAiImageSynthesizer::new(cfg.clone(), IMAGE_TIMEOUT),
                    )),
                    _ => warn!("Skipping openai images: no api key"),
                },
                ImageProviderKind::Gemini => match &providers.gemini {
                    Some(cfg) if !cfg.api_key.is_empty() => image.push(Arc::new(
                        GeminiImageSynthesizer::new(cfg.clone(), IMAGE_TIMEOUT),
                    )),
                    _ => warn!("Skipping gemini images: no api key"),
                },
            }
        }

        let video: Vec<Arc<dyn VideoSynthesizer>> =
            vec![Arc::new(PanZoomAnimator::new(media, config.engine.fps))];

        let mut music: Vec<Arc<dyn MusicSynthesizer>> = Vec::new();
        for kind in &providers.music {
            match kind {
                MusicProviderKind::Elevenlabs => match &providers.elevenlabs {
                    Some(cfg) if !cfg.api_key.is_empty() => {
                        music.push(Arc::new(ElevenLabsMusic::new(cfg.clone(), MUSIC_TIMEOUT)))
                    }
                    _ => warn!("Skipping elevenlabs music: no api key"),
                },
                MusicProviderKind::Local => music.push(Arc::new(LocalMusicLibrary::new(
                    config.storage.music_library_dir.clone(),
                ))),
            }
        }

        let feed_timeout = Duration::from_millis(config.engine.discovery_timeout_ms);
        let mut trend_sources: Vec<Arc<dyn TrendSource>> = providers
            .discovery_feeds
            .iter()
            .map(|url| {
                Arc::new(FeedTrendSource::new(url.clone(), feed_timeout)) as Arc<dyn TrendSource>
            })
            .collect();
        trend_sources.push(Arc::new(TopicTrendSource::new()));

        let set = Self {
            analyzer: FallbackChain::new("analysis", analyzers),
            drafter: FallbackChain::new("drafting", drafters),
            speech: FallbackChain::new("speech", speech),
            image: FallbackChain::new("image", image),
            video: FallbackChain::new("video", video),
            music: FallbackChain::new("music", music),
            sanitizer,
            trend_sources,
        };
        set.log_summary();
        set
    }

    fn log_summary(&self) {
        info!("LLM chain: {:?}", self.analyzer.names());
        info!("Speech chain: {:?}", self.speech.names());
        info!("Image chain: {:?}", self.image.names());
        info!("Music chain: {:?}", self.music.names());
        info!("Trend sources: {}", self.trend_sources.len());
    }
}
