//! Text-to-speech providers.

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::config::{EdgeTtsConfig, ElevenLabsConfig, OpenAiConfig};
use super::error::ProviderError;
use super::traits::{Provider, SpeechRequest, SpeechSynthesizer};

/// Write a downloaded asset, refusing empty bodies.
pub(crate) async fn write_media(
    provider: &str,
    output: &Path,
    bytes: &[u8],
) -> Result<(), ProviderError> {
    if bytes.is_empty() {
        return Err(ProviderError::invalid_response(provider, "empty audio body"));
    }
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ProviderError::failed(provider, e))?;
    }
    tokio::fs::write(output, bytes)
        .await
        .map_err(|e| ProviderError::failed(provider, e))
}

/// Read a successful response body or turn the error status into a failure.
pub(crate) async fn response_bytes(
    provider: &str,
    response: reqwest::Response,
) -> Result<Vec<u8>, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::failed(
            provider,
            format!("HTTP {}: {}", status.as_u16(), body),
        ));
    }
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| ProviderError::failed(provider, e))
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

// ============================================================================
// ElevenLabs
// ============================================================================

pub struct ElevenLabsSpeech {
    client: reqwest::Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsSpeech {
    pub fn new(config: ElevenLabsConfig, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct ElevenLabsTtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl Provider for ElevenLabsSpeech {
    fn name(&self) -> &str {
        "elevenlabs"
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSpeech {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<(), ProviderError> {
        let body = ElevenLabsTtsRequest {
            text: &request.text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1/text-to-speech/{}",
                self.config.api_base, self.config.voice_id
            ))
            .header("xi-api-key", &self.config.api_key)
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::failed(self.name(), e))?;

        let bytes = response_bytes(self.name(), response).await?;
        write_media(self.name(), &request.output, &bytes).await
    }
}

// ============================================================================
// OpenAI
// ============================================================================

pub struct OpenAiSpeech {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiSpeech {
    pub fn new(config: OpenAiConfig, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiSpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

impl Provider for OpenAiSpeech {
    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<(), ProviderError> {
        let body = OpenAiSpeechRequest {
            model: &self.config.tts_model,
            voice: &self.config.tts_voice,
            input: &request.text,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::failed(self.name(), e))?;

        let bytes = response_bytes(self.name(), response).await?;
        write_media(self.name(), &request.output, &bytes).await
    }
}

// ============================================================================
// edge-tts command line
// ============================================================================

/// Runs the `edge-tts` command, which needs no credentials.
pub struct EdgeTtsSpeech {
    config: EdgeTtsConfig,
    timeout: Duration,
}

impl EdgeTtsSpeech {
    pub fn new(config: EdgeTtsConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    fn build_args(&self, request: &SpeechRequest) -> Vec<String> {
        vec![
            "--voice".to_string(),
            self.config.voice.clone(),
            "--text".to_string(),
            request.text.clone(),
            "--write-media".to_string(),
            request.output.to_string_lossy().to_string(),
        ]
    }
}

impl Provider for EdgeTtsSpeech {
    fn name(&self) -> &str {
        "edge_tts"
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsSpeech {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<(), ProviderError> {
        if let Some(parent) = request.output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ProviderError::failed(self.name(), e))?;
        }

        let mut command = Command::new(&self.config.program);
        command
            .args(self.build_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                ProviderError::failed(self.name(), format!("timed out after {:?}", self.timeout))
            })?
            .map_err(|e| {
                ProviderError::failed(self.name(), format!("{}: {}", self.config.program, e))
            })?;

        if !output.status.success() {
            return Err(ProviderError::failed(
                self.name(),
                format!(
                    "exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        match tokio::fs::metadata(&request.output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(ProviderError::invalid_response(self.name(), "no audio written")),
        }
    }
}
