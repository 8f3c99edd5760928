//! Pipeline engine configuration.

use serde::{Deserialize, Serialize};

use crate::assembly::AssemblySettings;

/// Tunables of the stage sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Wall-clock budget shared by every trend source (milliseconds).
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_ms: u64,

    /// Maximum trend candidates kept after deduplication.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Crossfade between consecutive scene clips (seconds).
    #[serde(default = "default_crossfade")]
    pub crossfade_secs: f64,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Height of the assembled video. Must be even.
    #[serde(default = "default_target_height")]
    pub target_height: u32,

    /// Linear gain of the music bed under the voice.
    #[serde(default = "default_music_volume")]
    pub music_volume: f64,

    /// Longest track requested from generative music providers (seconds).
    #[serde(default = "default_generative_music_cap")]
    pub generative_music_cap_secs: f64,
}

fn default_discovery_timeout() -> u64 {
    10_000
}

fn default_max_candidates() -> usize {
    5
}

fn default_crossfade() -> f64 {
    0.5
}

fn default_fps() -> u32 {
    24
}

fn default_target_height() -> u32 {
    1080
}

fn default_music_volume() -> f64 {
    0.15
}

fn default_generative_music_cap() -> f64 {
    22.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: default_discovery_timeout(),
            max_candidates: default_max_candidates(),
            crossfade_secs: default_crossfade(),
            fps: default_fps(),
            target_height: default_target_height(),
            music_volume: default_music_volume(),
            generative_music_cap_secs: default_generative_music_cap(),
        }
    }
}

impl EngineConfig {
    pub fn assembly_settings(&self) -> AssemblySettings {
        AssemblySettings {
            crossfade_secs: self.crossfade_secs,
            fps: self.fps,
            target_height: self.target_height,
            music_volume: self.music_volume,
        }
    }
}
