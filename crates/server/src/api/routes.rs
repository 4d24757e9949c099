use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, mcp, middleware::metrics_middleware, tools};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // REST routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Tools
        .route("/tools", get(tools::list_tools))
        .route("/tools/{name}", post(tools::call_tool))
        .with_state(Arc::clone(&state));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/mcp", post(mcp::handle_mcp))
        .with_state(state)
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
