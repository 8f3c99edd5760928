//! FFmpeg-based media engine implementation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::MediaConfig;
use super::error::MediaError;
use super::traits::MediaEngine;
use super::types::{
    ConcatSpec, MediaInfo, MixSpec, PanDirection, PanZoomSpec, RenderJob, RenderResult,
    RenderSpec,
};
use crate::metrics::RENDERS_TOTAL;

static OUT_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"out_time_ms=(\d+)").expect("valid out_time regex"));

/// Audio bitrate for the final mix.
const AUDIO_BITRATE: &str = "192k";

/// FFmpeg-based media engine.
pub struct FfmpegEngine {
    config: MediaConfig,
}

impl FfmpegEngine {
    /// Creates a new FFmpeg engine with the given configuration.
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(MediaConfig::default())
    }

    fn path_arg(path: &Path) -> String {
        path.to_string_lossy().to_string()
    }

    /// H.264 video encoder settings shared by every render.
    fn video_encoder_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.config.x264_preset.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]
    }

    /// Log level, progress reporting, extra args and the output path.
    fn trailing_args(&self, output_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ];
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.push(Self::path_arg(output_path));
        args
    }

    /// `x`/`y` expressions for the zoompan filter.
    fn pan_expressions(pan: PanDirection, frames: u32) -> (String, String) {
        let center_x = "iw/2-(iw/zoom/2)".to_string();
        let center_y = "ih/2-(ih/zoom/2)".to_string();
        match pan {
            PanDirection::Left => (format!("(iw-iw/zoom)*(1-on/{})", frames), center_y),
            PanDirection::Right => (format!("(iw-iw/zoom)*on/{}", frames), center_y),
            PanDirection::Up => (center_x, format!("(ih-ih/zoom)*(1-on/{})", frames)),
            PanDirection::Down => (center_x, format!("(ih-ih/zoom)*on/{}", frames)),
            PanDirection::Center => (center_x, center_y),
        }
    }

    /// Builds ffmpeg arguments for animating a still image.
    ///
    /// The image is upscaled to twice the frame size before zooming so the
    /// zoompan filter has enough pixels to avoid jitter.
    fn build_pan_zoom_args(&self, spec: &PanZoomSpec, output_path: &Path) -> Vec<String> {
        let frames = spec.frame_count();
        let (w, h) = (spec.width, spec.height);
        let (x, y) = Self::pan_expressions(spec.pan, frames);
        let filter = format!(
            "scale={sw}:{sh}:force_original_aspect_ratio=increase,crop={sw}:{sh},\
             zoompan=z='1+{zoom:.3}*on/{frames}':x='{x}':y='{y}':d=1:s={w}x{h}:fps={fps},\
             format=yuv420p",
            sw = w * 2,
            sh = h * 2,
            zoom = spec.zoom_end - 1.0,
            frames = frames,
            x = x,
            y = y,
            w = w,
            h = h,
            fps = spec.fps,
        );

        let mut args = vec![
            "-y".to_string(),
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            spec.fps.to_string(),
            "-i".to_string(),
            Self::path_arg(&spec.image_path),
            "-vf".to_string(),
            filter,
            "-frames:v".to_string(),
            frames.to_string(),
        ];
        args.extend(self.video_encoder_args());
        args.push("-an".to_string());
        args.extend(self.trailing_args(output_path));
        args
    }

    /// Builds the filter graph joining clips with crossfades.
    fn concat_filter(spec: &ConcatSpec) -> (String, String) {
        let mut parts: Vec<String> = (0..spec.clips.len())
            .map(|i| {
                format!(
                    "[{i}:v]fps={fps},scale={w}:{h}:force_original_aspect_ratio=increase,\
                     crop={w}:{h},setsar=1,format=yuv420p[v{i}]",
                    i = i,
                    fps = spec.fps,
                    w = spec.width,
                    h = spec.height,
                )
            })
            .collect();

        let mut last = "v0".to_string();
        for (k, offset) in spec.xfade_offsets().iter().enumerate() {
            let next = format!("x{}", k + 1);
            parts.push(format!(
                "[{last}][v{clip}]xfade=transition=fade:duration={cf:.3}:offset={offset:.3}[{next}]",
                last = last,
                clip = k + 1,
                cf = spec.crossfade_secs,
                offset = offset,
                next = next,
            ));
            last = next;
        }

        (parts.join(";"), format!("[{}]", last))
    }

    /// Builds ffmpeg arguments for crossfade concatenation.
    fn build_concat_args(&self, spec: &ConcatSpec, output_path: &Path) -> Vec<String> {
        let mut args = vec!["-y".to_string()];
        for clip in &spec.clips {
            args.extend(["-i".to_string(), Self::path_arg(clip)]);
        }

        let (filter, out_label) = Self::concat_filter(spec);
        args.extend([
            "-filter_complex".to_string(),
            filter,
            "-map".to_string(),
            out_label,
        ]);
        args.extend(self.video_encoder_args());
        args.push("-an".to_string());
        args.extend(self.trailing_args(output_path));
        args
    }

    /// Builds ffmpeg arguments for the final mix.
    fn build_mix_args(&self, spec: &MixSpec, output_path: &Path) -> Vec<String> {
        let duration = format!("{:.3}", spec.duration_secs);
        let mut args = vec![
            "-y".to_string(),
            "-stream_loop".to_string(),
            spec.video_loops.saturating_sub(1).to_string(),
            "-i".to_string(),
            Self::path_arg(&spec.video_path),
            "-i".to_string(),
            Self::path_arg(&spec.voice_path),
        ];

        let mut filter =
            "[0:v]scale=trunc(iw/2)*2:trunc(ih/2)*2,setsar=1,format=yuv420p[v]".to_string();
        let audio_label = match &spec.music {
            Some(music) => {
                args.extend([
                    "-stream_loop".to_string(),
                    "-1".to_string(),
                    "-i".to_string(),
                    Self::path_arg(&music.path),
                ]);
                filter.push_str(&format!(
                    ";[2:a]volume={:.2},atrim=0:{},asetpts=PTS-STARTPTS[m]\
                     ;[1:a][m]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[a]",
                    music.volume, duration
                ));
                "[a]".to_string()
            }
            None => "1:a".to_string(),
        };

        args.extend([
            "-filter_complex".to_string(),
            filter,
            "-map".to_string(),
            "[v]".to_string(),
            "-map".to_string(),
            audio_label,
            "-t".to_string(),
            duration,
            "-r".to_string(),
            spec.fps.to_string(),
        ]);
        args.extend(self.video_encoder_args());
        args.extend([
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            AUDIO_BITRATE.to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]);
        args.extend(self.trailing_args(output_path));
        args
    }

    /// Input files a render job reads.
    fn inputs(spec: &RenderSpec) -> Vec<&Path> {
        match spec {
            RenderSpec::PanZoom(s) => vec![s.image_path.as_path()],
            RenderSpec::Concat(s) => s.clips.iter().map(PathBuf::as_path).collect(),
            RenderSpec::Mix(s) => {
                let mut inputs = vec![s.video_path.as_path(), s.voice_path.as_path()];
                if let Some(music) = &s.music {
                    inputs.push(music.path.as_path());
                }
                inputs
            }
        }
    }

    fn build_args(&self, job: &RenderJob) -> Result<Vec<String>, MediaError> {
        match &job.spec {
            RenderSpec::PanZoom(spec) => {
                if spec.duration_secs <= 0.0 || spec.fps == 0 {
                    return Err(MediaError::invalid_job("pan-zoom needs a positive duration"));
                }
                Ok(self.build_pan_zoom_args(spec, &job.output_path))
            }
            RenderSpec::Concat(spec) => {
                if spec.clips.is_empty() {
                    return Err(MediaError::invalid_job("concat needs at least one clip"));
                }
                if spec.clips.len() != spec.clip_durations.len() {
                    return Err(MediaError::invalid_job(format!(
                        "{} clips but {} durations",
                        spec.clips.len(),
                        spec.clip_durations.len()
                    )));
                }
                Ok(self.build_concat_args(spec, &job.output_path))
            }
            RenderSpec::Mix(spec) => {
                if spec.duration_secs <= 0.0 || spec.video_loops == 0 {
                    return Err(MediaError::invalid_job(
                        "mix needs a positive duration and at least one loop",
                    ));
                }
                Ok(self.build_mix_args(spec, &job.output_path))
            }
        }
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, MediaError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
        }

        let probe: ProbeOutput = serde_json::from_str(output)
            .map_err(|e| MediaError::probe_failed(format!("Invalid ffprobe output: {}", e)))?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");
        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
            video_fps: video_stream
                .and_then(|s| s.r_frame_rate.as_deref())
                .and_then(parse_frame_rate),
        })
    }

    async fn run_render(&self, job: &RenderJob) -> Result<RenderResult, MediaError> {
        let start = Instant::now();

        for input in Self::inputs(&job.spec) {
            if !input.exists() {
                return Err(MediaError::InputNotFound {
                    path: input.to_path_buf(),
                });
            }
        }

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|_| MediaError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                })?;
        }

        let args = self.build_args(job)?;
        let expected = job.spec.expected_duration();
        debug!(
            "Starting {} render {} -> {}",
            job.spec.kind(),
            job.job_id,
            job.output_path.display()
        );

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    MediaError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::render_failed("ffmpeg stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut last_report = Instant::now();
            let report_interval = Duration::from_secs(5);
            let mut error_output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }

                if let Some(micros) = OUT_TIME_RE
                    .captures(&line)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                {
                    if expected > 0.0 && last_report.elapsed() >= report_interval {
                        let percent = (micros / 1_000_000.0 / expected * 100.0).min(100.0);
                        debug!("Render {} at {:.0}%", job.job_id, percent);
                        last_report = Instant::now();
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        let failure = match result {
            Ok(Ok((status, error_output))) if !status.success() => {
                Some(MediaError::render_failed(
                    format!("FFmpeg exited with code: {:?}", status.code()),
                    if error_output.is_empty() {
                        None
                    } else {
                        Some(error_output)
                    },
                ))
            }
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(MediaError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                Some(MediaError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        };

        if let Some(err) = failure {
            // A partial file would look like a finished artifact on resume.
            if let Err(e) = tokio::fs::remove_file(&job.output_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        "Failed to remove partial output {}: {}",
                        job.output_path.display(),
                        e
                    );
                }
            }
            return Err(err);
        }

        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| MediaError::render_failed("Output file not created", None))?;
        if output_meta.len() == 0 {
            return Err(MediaError::render_failed("Output file is empty", None));
        }

        Ok(RenderResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Parse frame rate like "24000/1001" or "30".
fn parse_frame_rate(rate: &str) -> Option<f32> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f32>().ok()?;
            let den = den.parse::<f32>().ok()?;
            if den > 0.0 {
                Some(num / den)
            } else {
                None
            }
        }
        None => rate.parse::<f32>().ok(),
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError> {
        if !path.exists() {
            return Err(MediaError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    MediaError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(MediaError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn render(&self, job: RenderJob) -> Result<RenderResult, MediaError> {
        let result = self.run_render(&job).await;
        let outcome = if result.is_ok() { "success" } else { "error" };
        RENDERS_TOTAL
            .with_label_values(&[job.spec.kind(), outcome])
            .inc();
        result
    }

    async fn validate(&self) -> Result<(), MediaError> {
        let checks = [
            (&self.config.ffmpeg_path, true),
            (&self.config.ffprobe_path, false),
        ];
        for (binary, is_ffmpeg) in checks {
            if let Err(e) = Command::new(binary).arg("-version").output().await {
                if e.kind() == std::io::ErrorKind::NotFound {
                    let path = binary.clone();
                    return Err(if is_ffmpeg {
                        MediaError::FfmpegNotFound { path }
                    } else {
                        MediaError::FfprobeNotFound { path }
                    });
                }
                return Err(MediaError::Io(e));
            }
        }
        Ok(())
    }
}
