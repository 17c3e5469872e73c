use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::error;
use std::sync::Arc;

use super::AppState;
use crate::api::models::{PlayerDetail, RankingsResponse};
use crate::domain::PlayerId;
use crate::errors::BotError;
use crate::stats::{group_activity, summarize};

pub async fn get_rankings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.dispatcher.players().rankings() {
        Ok(items) => Json(RankingsResponse {
            total: items.len(),
            items,
        })
        .into_response(),
        Err(e) => {
            error!("Failed to build rankings: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Query Error: {}", e)).into_response()
        }
    }
}

pub async fn get_player_detail(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<PlayerId>,
) -> impl IntoResponse {
    let player = match state.dispatcher.players().profile(player_id) {
        Ok(player) => player,
        Err(BotError::NotRegistered) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to load player {}: {}", player_id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Query Error: {}", e)).into_response();
        }
    };

    let report = &state.config.report;
    Json(PlayerDetail {
        summary: summarize(&player, report.form_window),
        activity: group_activity(&player.matches, report.default_label),
    })
    .into_response()
}
