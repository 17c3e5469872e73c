use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::domain::{MatchRecord, OpponentRef, Player, PlayerId};

/// Stamped into `PRAGMA user_version`
pub const DATABASE_SCHEMA_VERSION: i64 = 1;

/// Stamped into every `match_records` row
pub const MATCH_RECORD_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Clone)]
pub struct PlayerRow {
    pub id: PlayerId,
    pub name: String,
    pub handle: Option<String>,
    pub rating: f64,
    pub highest_rating: f64,
    pub wins: i64,
    pub losses: i64,
    pub joined_at: DateTime<Utc>,
    pub last_match_date: Option<DateTime<Utc>>,
    pub active: bool,
}

impl PlayerRow {
    /// Validates the stored counters and attaches the match history
    pub fn into_player(self, matches: Vec<MatchRecord>) -> Result<Player> {
        if !self.rating.is_finite() || !self.highest_rating.is_finite() {
            anyhow::bail!("Player {} has a non-finite rating", self.id);
        }
        let wins = u32::try_from(self.wins)
            .map_err(|_| anyhow::anyhow!("Player {} has invalid wins: {}", self.id, self.wins))?;
        let losses = u32::try_from(self.losses).map_err(|_| {
            anyhow::anyhow!("Player {} has invalid losses: {}", self.id, self.losses)
        })?;

        Ok(Player {
            id: self.id,
            name: self.name,
            handle: self.handle,
            rating: self.rating,
            highest_rating: self.highest_rating,
            wins,
            losses,
            joined_at: self.joined_at,
            last_match_date: self.last_match_date,
            active: self.active,
            matches,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MatchRecordRow {
    pub id: i64,
    pub player_id: PlayerId,
    pub schema_version: i64,
    pub recorded_at: DateTime<Utc>,
    pub rating_change: f64,
    pub win_probability: f64,
    pub win: bool,
    pub sets_won: i64,
    pub sets_lost: i64,
    pub score: String,
    pub opponent_id: PlayerId,
    pub opponent_name: String,
    pub label: Option<String>,
}

impl MatchRecordRow {
    pub fn into_record(self) -> Result<MatchRecord> {
        if self.schema_version != MATCH_RECORD_SCHEMA_VERSION {
            anyhow::bail!(
                "Match record {} has unsupported schema version {}",
                self.id,
                self.schema_version
            );
        }
        let sets_won = u32::try_from(self.sets_won)
            .map_err(|_| anyhow::anyhow!("Match record {} has invalid sets won", self.id))?;
        let sets_lost = u32::try_from(self.sets_lost)
            .map_err(|_| anyhow::anyhow!("Match record {} has invalid sets lost", self.id))?;

        Ok(MatchRecord {
            timestamp: self.recorded_at,
            rating_change: self.rating_change,
            win_probability: self.win_probability,
            win: self.win,
            sets_won,
            sets_lost,
            score: self.score,
            opponent: OpponentRef {
                id: self.opponent_id,
                name: self.opponent_name,
            },
            label: self.label,
        })
    }
}
