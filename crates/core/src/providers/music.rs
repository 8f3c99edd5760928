//! Background music providers.

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::config::ElevenLabsConfig;
use super::error::ProviderError;
use super::speech::{http_client, response_bytes, write_media};
use super::traits::{MusicRequest, MusicSynthesizer, Provider};

/// ElevenLabs sound generation.
pub struct ElevenLabsMusic {
    client: reqwest::Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsMusic {
    pub fn new(config: ElevenLabsConfig, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct SoundGenerationRequest<'a> {
    text: &'a str,
    duration_seconds: f64,
    prompt_influence: f64,
}

impl Provider for ElevenLabsMusic {
    fn name(&self) -> &str {
        "elevenlabs_sound"
    }
}

#[async_trait]
impl MusicSynthesizer for ElevenLabsMusic {
    async fn compose(&self, request: &MusicRequest) -> Result<(), ProviderError> {
        let body = SoundGenerationRequest {
            text: &request.prompt,
            duration_seconds: request.generative_duration(),
            prompt_influence: 0.3,
        };

        let response = self
            .client
            .post(format!("{}/v1/sound-generation", self.config.api_base))
            .header("xi-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::failed(self.name(), e))?;

        let bytes = response_bytes(self.name(), response).await?;
        write_media(self.name(), &request.output, &bytes).await
    }
}

/// Picks a pre-supplied track from a directory of `*.mp3` / `*.wav` files.
pub struct LocalMusicLibrary {
    dir: PathBuf,
}

impl LocalMusicLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Candidate tracks sorted by file name.
    async fn tracks(&self) -> Result<Vec<PathBuf>, ProviderError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            ProviderError::failed(self.name(), format!("{}: {}", self.dir.display(), e))
        })?;

        let mut tracks = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ProviderError::failed(self.name(), e))?
        {
            let path = entry.path();
            if is_track(&path) {
                tracks.push(path);
            }
        }
        tracks.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(tracks)
    }
}

fn is_track(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "mp3" | "wav"))
        .unwrap_or(false)
}

/// Stable index into a list of `len` entries for a run.
pub fn pick_index(run_id: &str, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let digest = Sha256::digest(run_id.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % len as u64) as usize
}

impl Provider for LocalMusicLibrary {
    fn name(&self) -> &str {
        "local_library"
    }
}

#[async_trait]
impl MusicSynthesizer for LocalMusicLibrary {
    async fn compose(&self, request: &MusicRequest) -> Result<(), ProviderError> {
        let tracks = self.tracks().await?;
        if tracks.is_empty() {
            return Err(ProviderError::failed(
                self.name(),
                format!("no tracks in {}", self.dir.display()),
            ));
        }

        let track = &tracks[pick_index(&request.run_id, tracks.len())];
        debug!("Run {} uses library track {}", request.run_id, track.display());

        if let Some(parent) = request.output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ProviderError::failed(self.name(), e))?;
        }
        tokio::fs::copy(track, &request.output)
            .await
            .map(|_| ())
            .map_err(|e| ProviderError::failed(self.name(), e))
    }
}
