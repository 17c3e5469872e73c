use serde::Serialize;

use super::form::{rating_change, recent_form};
use crate::domain::{Player, PlayerId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub handle: Option<String>,
    pub rating: f64,
    pub form: String,
    pub rating_change: f64,
    pub matches_played: u32,
}

/// Leaderboard of active players, highest rating first.
///
/// The sort is stable, so equal ratings keep the order they were given in.
pub fn build_rankings(players: &[Player], window: usize) -> Vec<RankingEntry> {
    let mut active: Vec<&Player> = players.iter().filter(|p| p.active).collect();
    active.sort_by(|a, b| b.rating.total_cmp(&a.rating));

    active
        .into_iter()
        .enumerate()
        .map(|(idx, player)| RankingEntry {
            rank: idx + 1,
            player_id: player.id,
            name: player.name.clone(),
            handle: player.handle.clone(),
            rating: player.rating,
            form: recent_form(&player.matches, window),
            rating_change: rating_change(&player.matches, window),
            matches_played: player.matches_played(),
        })
        .collect()
}
