//! Generation back ends and the fallback chains that order them.
//!
//! Each capability is a trait ([`ScriptAnalyzer`], [`SpeechSynthesizer`], ...)
//! and the pipeline only ever calls a [`FallbackChain`] of them. The chains for
//! one deployment are collected in a [`ProviderSet`].

mod analyzer;
mod chain;
mod config;
mod discovery;
mod drafter;
mod error;
mod image;
pub mod llm;
mod music;
mod registry;
mod sanitizer;
mod speech;
mod traits;
mod video;

pub use analyzer::LlmScriptAnalyzer;
pub use chain::FallbackChain;
pub use config::{
    EdgeTtsConfig, ElevenLabsConfig, GeminiConfig, ImageProviderKind, LlmBackend, LlmConfig,
    MusicProviderKind, OpenAiConfig, ProvidersConfig, SpeechProviderKind,
};
pub use discovery::{FeedTrendSource, TopicTrendSource};
pub use drafter::LlmContentDrafter;
pub use error::{ChainExhausted, ProviderError};
pub use image::{GeminiImageSynthesizer, OpenAiImageSynthesizer};
pub use llm::{GeminiClient, LlmClient, LlmError};
pub use music::{pick_index, ElevenLabsMusic, LocalMusicLibrary};
pub use registry::ProviderSet;
pub use sanitizer::LlmPromptSanitizer;
pub use speech::{EdgeTtsSpeech, ElevenLabsSpeech, OpenAiSpeech};
pub use traits::{
    AnalysisRequest, ContentDrafter, DraftRequest, ImageRequest, ImageSynthesizer, MusicRequest,
    MusicSynthesizer, PromptSanitizer, Provider, ScriptAnalyzer, SpeechRequest, SpeechSynthesizer,
    TrendSource, VideoRequest, VideoSynthesizer,
};
pub use video::{camera_motion, PanZoomAnimator};
