//! Discovery: best-effort trend context for the topic.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use super::stage::{Stage, StageContext};
use super::state::{RunState, StageOutcome};
use crate::content::TrendCandidate;
use crate::metrics::CANDIDATES_DISCOVERED;
use crate::run::{RunField, RunStatus};

/// Keep the first candidate per url, in order, up to `cap`.
pub fn dedup_candidates(
    batches: impl IntoIterator<Item = Vec<TrendCandidate>>,
    cap: usize,
) -> Vec<TrendCandidate> {
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|c| seen.insert(c.url.clone()))
        .take(cap)
        .collect()
}

pub struct DiscoveryStage;

#[async_trait]
impl Stage for DiscoveryStage {
    fn name(&self) -> &'static str {
        "discovery"
    }

    async fn run(&self, state: &mut RunState, ctx: &StageContext) -> StageOutcome {
        ctx.report(state, RunStatus::Searching, 10);

        let deadline = Instant::now() + Duration::from_millis(ctx.config.discovery_timeout_ms);
        let topic = state.topic.as_str();

        let probes = ctx.providers.trend_sources.iter().map(|source| async move {
            match timeout_at(deadline, source.discover(topic)).await {
                Ok(Ok(candidates)) => {
                    debug!("{} returned {} candidates", source.name(), candidates.len());
                    candidates
                }
                Ok(Err(e)) => {
                    warn!("Trend source failed: {}", e);
                    Vec::new()
                }
                Err(_) => {
                    warn!("Trend source {} missed the discovery deadline", source.name());
                    Vec::new()
                }
            }
        });

        let candidates = dedup_candidates(join_all(probes).await, ctx.config.max_candidates);
        CANDIDATES_DISCOVERED
            .with_label_values(&[])
            .observe(candidates.len() as f64);
        info!(
            "Run {} discovered {} candidates for '{}'",
            state.run_id,
            candidates.len(),
            state.topic
        );

        state.selected_trend = candidates.first().cloned();
        state.candidates = candidates;
        ctx.persist(
            state,
            RunField::TrendSourceUrl(state.selected_trend.as_ref().map(|t| t.url.clone())),
        );

        StageOutcome::Completed
    }
}
