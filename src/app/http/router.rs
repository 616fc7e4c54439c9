//! Router configuration for the HTTP server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    // 前端從其他來源直接呼叫
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/compute-ndvi", post(handlers::compute_ndvi))
        .route("/api/generate-tiles", post(handlers::generate_tiles))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
