use chrono::{DateTime, Utc};
use serde::Serialize;

use super::form::{rating_change, recent_form};
use crate::domain::{Player, PlayerId};

/// Display-ready profile of one player
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player_id: PlayerId,
    pub name: String,
    pub handle: Option<String>,
    pub rating: f64,
    pub highest_rating: f64,
    pub wins: u32,
    pub losses: u32,
    pub matches_played: u32,
    pub form: String,
    pub rating_change: f64,
    pub joined_at: DateTime<Utc>,
    pub last_match_date: Option<DateTime<Utc>>,
}

pub fn summarize(player: &Player, window: usize) -> PlayerSummary {
    PlayerSummary {
        player_id: player.id,
        name: player.name.clone(),
        handle: player.handle.clone(),
        rating: player.rating,
        highest_rating: player.highest_rating,
        wins: player.wins,
        losses: player.losses,
        matches_played: player.matches_played(),
        form: recent_form(&player.matches, window),
        rating_change: rating_change(&player.matches, window),
        joined_at: player.joined_at,
        last_match_date: player.last_match_date,
    }
}
