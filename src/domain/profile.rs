use chrono::{DateTime, Utc};

use super::models::{MatchRecord, MatchResult, Player};
use crate::rating::EloOutcome;

/// Everything needed to apply one match to one player's profile
#[derive(Debug, Clone, PartialEq)]
pub struct MatchUpdate {
    pub rating_delta: f64,
    pub record: MatchRecord,
}

/// Splits a decided match into the winner's and the loser's update
pub fn build_updates(
    result: &MatchResult,
    elo: &EloOutcome,
    now: DateTime<Utc>,
) -> (MatchUpdate, MatchUpdate) {
    let winner = MatchUpdate {
        rating_delta: elo.winner_gain,
        record: MatchRecord {
            timestamp: now,
            rating_change: elo.winner_gain,
            win_probability: elo.winner_expected,
            win: true,
            sets_won: result.winner_sets_won,
            sets_lost: result.loser_sets_won,
            score: result.winner_score(),
            opponent: result.loser.opponent_ref(),
            label: result.label.clone(),
        },
    };

    let loser = MatchUpdate {
        rating_delta: elo.loser_loss,
        record: MatchRecord {
            timestamp: now,
            rating_change: elo.loser_loss,
            win_probability: elo.loser_expected,
            win: false,
            sets_won: result.loser_sets_won,
            sets_lost: result.winner_sets_won,
            score: result.loser_score(),
            opponent: result.winner.opponent_ref(),
            label: result.label.clone(),
        },
    };

    (winner, loser)
}

/// Applies a match to the player's current state.
///
/// The high-water mark tracks the rating after the update, and the record
/// is appended, never inserted.
pub fn apply_update(player: &mut Player, update: &MatchUpdate) {
    player.rating += update.rating_delta;
    player.highest_rating = player.highest_rating.max(player.rating);

    if update.record.win {
        player.wins += 1;
    } else {
        player.losses += 1;
    }

    player.last_match_date = Some(update.record.timestamp);
    player.matches.push(update.record.clone());
}
