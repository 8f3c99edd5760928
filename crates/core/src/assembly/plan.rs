use crate::content::AspectRatio;

/// Fixed parameters of an assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblySettings {
    /// Upper bound for the crossfade between consecutive clips.
    pub crossfade_secs: f64,
    pub fps: u32,
    /// Height every clip is resampled to before joining.
    pub target_height: u32,
    /// Linear gain of the music bed.
    pub music_volume: f64,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            crossfade_secs: 0.5,
            fps: 24,
            target_height: 1080,
            music_volume: 0.15,
        }
    }
}

/// Round to the nearest even value, never below 2.
///
/// libx264 with yuv420p rejects odd frame dimensions.
pub fn even_dimension(value: f64) -> u32 {
    let rounded = ((value / 2.0).round() * 2.0) as i64;
    rounded.max(2) as u32
}

/// Timing and geometry of one assembly, computed before anything is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyPlan {
    pub clip_durations: Vec<f64>,
    /// Effective crossfade: the configured value, shortened for very short clips.
    pub crossfade_secs: f64,
    /// Length of the joined sequence.
    pub concat_duration: f64,
    pub voice_duration: f64,
    /// How many times the sequence plays back to back.
    pub loops: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl AssemblyPlan {
    /// Returns `None` when there are no clips or the voice has no length.
    pub fn compute(
        clip_durations: Vec<f64>,
        voice_duration: f64,
        aspect_ratio: AspectRatio,
        settings: &AssemblySettings,
    ) -> Option<Self> {
        if clip_durations.is_empty() || voice_duration <= 0.0 {
            return None;
        }

        let shortest = clip_durations.iter().copied().fold(f64::INFINITY, f64::min);
        let crossfade_secs = settings.crossfade_secs.min(shortest / 2.0).max(0.0);

        let total: f64 = clip_durations.iter().sum();
        let transitions = (clip_durations.len() - 1) as f64;
        let concat_duration = total - transitions * crossfade_secs;

        let loops = if concat_duration > 0.0 && concat_duration < voice_duration {
            (voice_duration / concat_duration).floor() as u32 + 1
        } else {
            1
        };

        let height = even_dimension(settings.target_height as f64);
        let width = even_dimension(height as f64 * aspect_ratio.ratio());

        Some(Self {
            clip_durations,
            crossfade_secs,
            concat_duration,
            voice_duration,
            loops,
            width,
            height,
            fps: settings.fps,
        })
    }

    /// Length of the looped picture before trimming.
    pub fn looped_duration(&self) -> f64 {
        self.concat_duration * self.loops as f64
    }

    /// Length of the final output.
    pub fn output_duration(&self) -> f64 {
        self.voice_duration
    }
}
