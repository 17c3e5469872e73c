use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use log::{error, info, warn};
use std::sync::Arc;

use super::AppState;
use crate::bot::Update;

/// Telegram webhook. Without a configured secret every call is refused;
/// anything past the secret check is acknowledged with 200 so Telegram does
/// not redeliver updates we cannot use.
pub async fn receive_update(
    State(state): State<Arc<AppState>>,
    Path(secret): Path<String>,
    body: String,
) -> StatusCode {
    if state.config.bot.webhook_secret.as_deref() != Some(secret.as_str()) {
        warn!("Webhook call with an invalid secret");
        return StatusCode::UNAUTHORIZED;
    }

    let update: Update = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Ignoring undecodable update: {}", e);
            return StatusCode::OK;
        }
    };

    let replies = state.dispatcher.handle(&update);

    for reply in &replies {
        match &state.telegram {
            Some(telegram) => {
                if let Err(e) = telegram.send_message(reply).await {
                    error!("{:#}", e);
                }
            }
            None => info!("Reply to chat {} (not sent): {}", reply.chat_id, reply.text),
        }
    }

    StatusCode::OK
}
