pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Loaded inputs
        .route("/api/v1/profile", get(handlers::handle_get_profile))
        .route("/api/v1/categories", get(handlers::handle_get_categories))
        // Matching
        .route(
            "/api/v1/offerings/score",
            post(handlers::handle_score_offering),
        )
        .route("/api/v1/runs", post(handlers::handle_run))
        .with_state(state)
}
