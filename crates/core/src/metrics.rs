//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Runs (started, completed, failed, stage durations)
//! - Providers (attempts per capability, chain exhaustions)
//! - Media rendering
//! - LLM token usage

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Run Metrics
// =============================================================================

/// Pipeline executions started, including resumed attempts.
pub static RUNS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("reelsmith_runs_started_total", "Total pipeline runs started").unwrap()
});

/// Runs that reached PENDING_APPROVAL.
pub static RUNS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelsmith_runs_completed_total",
        "Total pipeline runs that produced a video",
    )
    .unwrap()
});

/// Runs that ended in ERROR.
pub static RUNS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("reelsmith_runs_failed_total", "Total pipeline runs that failed").unwrap()
});

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("reelsmith_stage_duration_seconds", "Duration of pipeline stages")
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 180.0, 600.0]),
        &["stage", "outcome"], // outcome: "completed", "resumed", "fatal"
    )
    .unwrap()
});

/// Runs published after approval.
pub static RUNS_PUBLISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelsmith_publish_total", "Total publish attempts"),
        &["result"], // "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Provider Metrics
// =============================================================================

/// Provider calls by capability, provider and result.
pub static PROVIDER_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelsmith_provider_attempts_total", "Total provider calls"),
        &["capability", "provider", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Fallback chains in which every provider failed.
pub static CHAIN_EXHAUSTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelsmith_chain_exhaustions_total",
            "Total fallback chains with no successful provider",
        ),
        &["capability"],
    )
    .unwrap()
});

/// Trend candidates returned per discovery.
pub static CANDIDATES_DISCOVERED: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelsmith_candidates_discovered",
            "Number of trend candidates kept per discovery",
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 10.0]),
        &[],
    )
    .unwrap()
});

/// LLM tokens used.
pub static LLM_TOKENS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelsmith_llm_tokens_total", "Total LLM tokens used"),
        &["provider", "direction"], // direction: "input", "output"
    )
    .unwrap()
});

// =============================================================================
// Media Metrics
// =============================================================================

/// Render jobs by kind and result.
pub static RENDERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelsmith_renders_total", "Total media render jobs"),
        &["kind", "result"], // kind: "pan_zoom", "concat", "mix"
    )
    .unwrap()
});

/// Scenes dropped during animation.
pub static SCENES_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelsmith_scenes_dropped_total", "Total scenes dropped"),
        &["reason"], // "image", "animation"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Runs
        Box::new(RUNS_STARTED.clone()),
        Box::new(RUNS_COMPLETED.clone()),
        Box::new(RUNS_FAILED.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(RUNS_PUBLISHED.clone()),
        // Providers
        Box::new(PROVIDER_ATTEMPTS.clone()),
        Box::new(CHAIN_EXHAUSTIONS.clone()),
        Box::new(CANDIDATES_DISCOVERED.clone()),
        Box::new(LLM_TOKENS.clone()),
        // Media
        Box::new(RENDERS_TOTAL.clone()),
        Box::new(SCENES_DROPPED.clone()),
    ]
}
