//! Still image generation.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::config::{GeminiConfig, OpenAiConfig};
use super::error::ProviderError;
use super::speech::{http_client, response_bytes, write_media};
use super::traits::{ImageRequest, ImageSynthesizer, Provider};
use crate::content::AspectRatio;

const PROMPT_PREFIX: &str = "Cinematic wide shot, photorealistic, 8k: ";

/// OpenAI image generation (DALL-E 3 by default).
pub struct OpenAiImageSynthesizer {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiImageSynthesizer {
    pub fn new(config: OpenAiConfig, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            config,
        }
    }

    /// Closest supported canvas for an aspect ratio.
    fn size_for(aspect_ratio: AspectRatio) -> &'static str {
        match aspect_ratio {
            AspectRatio::Portrait | AspectRatio::Vertical => "1024x1792",
            AspectRatio::Landscape => "1792x1024",
            AspectRatio::Square => "1024x1024",
        }
    }

    fn classify_error(&self, status: u16, body: &str) -> ProviderError {
        let parsed = serde_json::from_str::<ImageErrorBody>(body).ok();
        let code = parsed
            .as_ref()
            .and_then(|b| b.error.code.clone())
            .unwrap_or_default();
        let message = parsed
            .map(|b| b.error.message)
            .unwrap_or_else(|| body.to_string());

        if code == "content_policy_violation" || body.contains("content_policy_violation") {
            ProviderError::policy_violation(self.name(), message)
        } else {
            ProviderError::failed(self.name(), format!("HTTP {}: {}", status, message))
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: String,
    size: &'a str,
    quality: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageErrorBody {
    error: ImageErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ImageErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl Provider for OpenAiImageSynthesizer {
    fn name(&self) -> &str {
        "openai_images"
    }
}

#[async_trait]
impl ImageSynthesizer for OpenAiImageSynthesizer {
    async fn generate(&self, request: &ImageRequest) -> Result<(), ProviderError> {
        let body = ImageGenerationRequest {
            model: &self.config.image_model,
            prompt: format!("{}{}", PROMPT_PREFIX, request.prompt),
            size: Self::size_for(request.aspect_ratio),
            quality: "hd",
            n: 1,
        };

        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::failed(self.name(), e))?;

        let status = response.status().as_u16();
        if status != 200 {
            let text = response.text().await.unwrap_or_default();
            return Err(self.classify_error(status, &text));
        }

        let generated: ImageGenerationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(self.name(), e))?;
        let url = generated
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| ProviderError::invalid_response(self.name(), "no image url"))?;

        let download = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::failed(self.name(), e))?;
        let bytes = response_bytes(self.name(), download).await?;
        write_media(self.name(), &request.output, &bytes).await
    }
}

// ============================================================================
// Gemini Imagen
// ============================================================================

/// Google Imagen through the Gemini API `predict` endpoint.
pub struct GeminiImageSynthesizer {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiImageSynthesizer {
    pub fn new(config: GeminiConfig, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            config,
        }
    }

    fn aspect_ratio_for(aspect_ratio: AspectRatio) -> &'static str {
        match aspect_ratio {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Vertical => "3:4",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Square => "1:1",
        }
    }

    fn classify_error(&self, status: u16, body: &str) -> ProviderError {
        let message = serde_json::from_str::<ImageErrorBody>(body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| body.to_string());
        let lowered = message.to_lowercase();
        if lowered.contains("safety") || lowered.contains("blocked") {
            ProviderError::policy_violation(self.name(), message)
        } else {
            ProviderError::failed(self.name(), format!("HTTP {}: {}", status, message))
        }
    }

    /// Decode the first returned image. Filtered generations come back without bytes.
    fn decode(&self, response: ImagenResponse) -> Result<Vec<u8>, ProviderError> {
        let mut filtered = None;
        for prediction in response.predictions {
            if let Some(encoded) = prediction.bytes_base64_encoded {
                return STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|e| ProviderError::invalid_response(self.name(), e));
            }
            if prediction.rai_filtered_reason.is_some() {
                filtered = prediction.rai_filtered_reason;
            }
        }
        Err(ProviderError::policy_violation(
            self.name(),
            filtered.unwrap_or_else(|| "no image returned".to_string()),
        ))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenRequest<'a> {
    instances: Vec<ImagenInstance>,
    parameters: ImagenParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ImagenInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters<'a> {
    sample_count: u8,
    aspect_ratio: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<ImagenPrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenPrediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

impl Provider for GeminiImageSynthesizer {
    fn name(&self) -> &str {
        "gemini_imagen"
    }
}

#[async_trait]
impl ImageSynthesizer for GeminiImageSynthesizer {
    async fn generate(&self, request: &ImageRequest) -> Result<(), ProviderError> {
        let body = ImagenRequest {
            instances: vec![ImagenInstance {
                prompt: format!("{}{}", PROMPT_PREFIX, request.prompt),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: Self::aspect_ratio_for(request.aspect_ratio),
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:predict",
                self.config.api_base, self.config.image_model
            ))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::failed(self.name(), e))?;

        let status = response.status().as_u16();
        if status != 200 {
            let text = response.text().await.unwrap_or_default();
            return Err(self.classify_error(status, &text));
        }

        let generated: ImagenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(self.name(), e))?;
        let bytes = self.decode(generated)?;
        write_media(self.name(), &request.output, &bytes).await
    }
}
