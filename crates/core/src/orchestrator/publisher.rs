//! Publishing of approved runs.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::run::RunRecord;

#[derive(Debug, Clone, Error)]
#[error("publish failed: {0}")]
pub struct PublishError(pub String);

/// Destination for approved videos.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, run: &RunRecord) -> Result<(), PublishError>;
}

/// Pretends to upload: waits for the configured delay and succeeds.
pub struct StubPublisher {
    delay: Duration,
}

impl StubPublisher {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Publisher for StubPublisher {
    fn name(&self) -> &str {
        "stub"
    }

    async fn publish(&self, run: &RunRecord) -> Result<(), PublishError> {
        tokio::time::sleep(self.delay).await;
        info!(
            "Published run {} to {} ({})",
            run.id,
            run.platform,
            run.video_url.as_deref().unwrap_or("no video")
        );
        Ok(())
    }
}
