use axum::{Router, extract::State, http::StatusCode, routing::get};
use tracing::error;

use crate::api;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api::router())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> StatusCode {
    match state.repo.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            error!("health check failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
