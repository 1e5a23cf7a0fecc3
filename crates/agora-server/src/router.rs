use std::sync::Arc;

use agora_sdk::Agent;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;

/// Shared handler state: the hosted replica.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
}

impl AppState {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent }
    }
}

/// Build the axum router with all Agora endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/posts", post(handler::create_post_handler))
        .route("/v1/posts/:address", get(handler::get_post_handler))
        .route("/v1/bases/:base/posts", get(handler::list_posts_handler))
        .route("/v1/bases/:base/adjacency", get(handler::adjacency_handler))
        .route("/v1/consistency", post(handler::consistency_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
