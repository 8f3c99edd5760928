//! Mock publisher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::orchestrator::{PublishError, Publisher};
use crate::run::RunRecord;

/// Mock implementation of the Publisher trait.
///
/// Publishes immediately and records the run ids it was handed.
#[derive(Debug, Default)]
pub struct MockPublisher {
    published: Arc<RwLock<Vec<String>>>,
    /// If set, the next publish fails with this error.
    next_error: Arc<RwLock<Option<PublishError>>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_next_error(&self, error: PublishError) {
        *self.next_error.write().await = Some(error);
    }

    /// Ids of the runs published so far, in order.
    pub async fn published(&self) -> Vec<String> {
        self.published.read().await.clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish(&self, run: &RunRecord) -> Result<(), PublishError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        self.published.write().await.push(run.id.clone());
        Ok(())
    }
}
