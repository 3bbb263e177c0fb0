use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{metrics_middleware, session_middleware};
use super::{handlers, history, triggers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.config().server.max_upload_bytes;

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Upload and trigger
        .route("/triggers", post(triggers::create_triggers))
        // Session history
        .route(
            "/history",
            get(history::get_history).delete(history::clear_history),
        )
        .route("/history/export", get(history::export_history))
        .layer(middleware::from_fn(session_middleware))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
