use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers::{
    health,
    players::{get_player_detail, get_rankings},
    webhook::receive_update,
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook/:secret", post(receive_update))
        .route("/api/rankings", get(get_rankings))
        .route("/api/player/:id", get(get_player_detail))
        .route("/health", get(health))
        .with_state(state)
}
