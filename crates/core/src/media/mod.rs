//! Media rendering for scene clips and the final assembled video.
//!
//! The [`MediaEngine`] trait executes three kinds of render job:
//!
//! - `PanZoom`: animate a still image into a clip with a slow zoom and drift
//! - `Concat`: join clips with crossfades at a common frame size and rate
//! - `Mix`: loop the picture, lay voice and attenuated music under it, trim to length
//!
//! [`FfmpegEngine`] drives the ffmpeg and ffprobe binaries.

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::MediaConfig;
pub use error::MediaError;
pub use ffmpeg::FfmpegEngine;
pub use traits::MediaEngine;
pub use types::{
    ConcatSpec, MediaInfo, MixSpec, MusicBed, PanDirection, PanZoomSpec, RenderJob, RenderResult,
    RenderSpec,
};
