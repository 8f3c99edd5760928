use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use super::{handlers, middleware::metrics_middleware, runs};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let storage = &state.config().storage;
    let assets_dir = storage.artifact_dir.clone();
    let assets_path = match storage.public_base.trim_end_matches('/') {
        "" => "/assets".to_string(),
        base => base.to_string(),
    };

    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Runs
        .route("/runs", post(runs::start_run).get(runs::list_runs))
        .route("/runs/{id}", get(runs::get_run).delete(runs::delete_run))
        .route("/runs/{id}/approve", post(runs::approve_run))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest_service(&assets_path, ServeDir::new(assets_dir))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
