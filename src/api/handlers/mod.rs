use axum::Json;
use std::sync::Arc;

use crate::api::models::HealthResponse;
use crate::bot::{Dispatcher, TelegramClient};
use crate::config::AppConfig;

pub mod players;
pub mod webhook;

pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Absent when no bot token is configured; replies are then only logged
    pub telegram: Option<TelegramClient>,
    pub config: Arc<AppConfig>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
