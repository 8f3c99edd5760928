//! Render job descriptions and probe results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Direction the virtual camera drifts during a pan-and-zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanDirection {
    Left,
    Right,
    Up,
    Down,
    Center,
}

impl PanDirection {
    pub const ALL: [PanDirection; 5] = [
        PanDirection::Left,
        PanDirection::Right,
        PanDirection::Up,
        PanDirection::Down,
        PanDirection::Center,
    ];
}

/// Animate a still image into a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanZoomSpec {
    pub image_path: PathBuf,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Zoom factor reached on the last frame (starts at 1.0).
    pub zoom_end: f64,
    pub pan: PanDirection,
}

impl PanZoomSpec {
    /// Number of frames rendered for the clip.
    pub fn frame_count(&self) -> u32 {
        (self.duration_secs * self.fps as f64).ceil().max(1.0) as u32
    }
}

/// Join clips with crossfades into one silent sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatSpec {
    pub clips: Vec<PathBuf>,
    /// Duration of each clip, same order as `clips`.
    pub clip_durations: Vec<f64>,
    pub crossfade_secs: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl ConcatSpec {
    /// Start offset of each crossfade, measured on the merged timeline.
    ///
    /// Transition `k` blends clip `k + 1` into everything before it, starting
    /// `crossfade_secs` before the merged stream ends.
    pub fn xfade_offsets(&self) -> Vec<f64> {
        let mut offsets = Vec::with_capacity(self.clip_durations.len().saturating_sub(1));
        let Some(first) = self.clip_durations.first() else {
            return offsets;
        };

        let mut merged = *first;
        for duration in self.clip_durations.iter().skip(1) {
            offsets.push(merged - self.crossfade_secs);
            merged += duration - self.crossfade_secs;
        }
        offsets
    }

    /// Length of the merged sequence.
    pub fn output_duration(&self) -> f64 {
        let total: f64 = self.clip_durations.iter().sum();
        let transitions = self.clip_durations.len().saturating_sub(1) as f64;
        total - transitions * self.crossfade_secs
    }
}

/// Background music laid under the voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicBed {
    pub path: PathBuf,
    /// Linear gain applied before mixing.
    pub volume: f64,
}

/// Final mix: looped picture, voice, optional music, trimmed to an exact length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixSpec {
    pub video_path: PathBuf,
    /// How many times the picture plays back to back.
    pub video_loops: u32,
    pub voice_path: PathBuf,
    pub music: Option<MusicBed>,
    /// Exact output length.
    pub duration_secs: f64,
    pub fps: u32,
}

/// What a render job produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderSpec {
    PanZoom(PanZoomSpec),
    Concat(ConcatSpec),
    Mix(MixSpec),
}

impl RenderSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            RenderSpec::PanZoom(_) => "pan_zoom",
            RenderSpec::Concat(_) => "concat",
            RenderSpec::Mix(_) => "mix",
        }
    }

    /// Duration the output is expected to have.
    pub fn expected_duration(&self) -> f64 {
        match self {
            RenderSpec::PanZoom(spec) => spec.duration_secs,
            RenderSpec::Concat(spec) => spec.output_duration(),
            RenderSpec::Mix(spec) => spec.duration_secs,
        }
    }
}

/// A render job submitted to a media engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub job_id: String,
    pub output_path: PathBuf,
    pub spec: RenderSpec,
}

/// Result of a successful render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    pub job_id: String,
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    /// Wall-clock time spent rendering.
    pub elapsed_ms: u64,
}

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// File path.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Container format (e.g., "mp3", "mov").
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_fps: Option<f32>,
}
