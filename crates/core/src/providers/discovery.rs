//! Trend discovery sources.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::error::ProviderError;
use super::speech::http_client;
use super::traits::{Provider, TrendSource};
use crate::content::TrendCandidate;

/// Reads candidate lists from an HTTP endpoint returning JSON.
///
/// The topic is appended as a `topic` query parameter. The body may be a bare
/// array of candidates or an object with a `candidates` array.
pub struct FeedTrendSource {
    client: reqwest::Client,
    url: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedBody {
    List(Vec<TrendCandidate>),
    Wrapped { candidates: Vec<TrendCandidate> },
}

impl FeedTrendSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let url = url.into();
        Self {
            client: http_client(timeout),
            name: format!("feed:{}", url),
            url,
        }
    }

    fn request_url(&self, topic: &str) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}topic={}",
            self.url,
            separator,
            urlencoding::encode(topic)
        )
    }
}

impl Provider for FeedTrendSource {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl TrendSource for FeedTrendSource {
    async fn discover(&self, topic: &str) -> Result<Vec<TrendCandidate>, ProviderError> {
        let url = self.request_url(topic);
        debug!("Querying trend feed {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::failed(&self.name, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::failed(
                &self.name,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let body: FeedBody = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(&self.name, e))?;
        Ok(match body {
            FeedBody::List(candidates) => candidates,
            FeedBody::Wrapped { candidates } => candidates,
        })
    }
}

/// Always yields one synthetic candidate built from the topic itself.
#[derive(Debug, Default)]
pub struct TopicTrendSource;

impl TopicTrendSource {
    pub fn new() -> Self {
        Self
    }

    pub fn candidate_for(topic: &str) -> TrendCandidate {
        let first_word = topic
            .split_whitespace()
            .next()
            .unwrap_or("trending")
            .to_lowercase();
        TrendCandidate {
            source_id: "strategic_fallback".to_string(),
            description: format!("Strategic hook based on latest {} discussions.", topic),
            hashtags: vec!["viral".to_string(), first_word],
            music_id: None,
            transcript: Some(
                "System-generated strategic insight based on topic keyword.".to_string(),
            ),
            author: "StrategyBot".to_string(),
            url: format!(
                "https://www.google.com/search?q={}",
                urlencoding::encode(topic)
            ),
        }
    }
}

impl Provider for TopicTrendSource {
    fn name(&self) -> &str {
        "topic"
    }
}

#[async_trait]
impl TrendSource for TopicTrendSource {
    async fn discover(&self, topic: &str) -> Result<Vec<TrendCandidate>, ProviderError> {
        Ok(vec![Self::candidate_for(topic)])
    }
}
