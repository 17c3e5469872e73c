use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type PlayerId = i64;

/// Registered community member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub handle: Option<String>,
    pub rating: f64,
    pub highest_rating: f64,
    pub wins: u32,
    pub losses: u32,
    pub joined_at: DateTime<Utc>,
    pub last_match_date: Option<DateTime<Utc>>,
    pub active: bool,
    /// Chronological, append-only
    pub matches: Vec<MatchRecord>,
}

impl Player {
    pub fn new(
        id: PlayerId,
        name: &str,
        handle: Option<&str>,
        starter_rating: f64,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            handle: handle.map(normalize_handle).filter(|h| !h.is_empty()),
            rating: starter_rating,
            highest_rating: starter_rating,
            wins: 0,
            losses: 0,
            joined_at,
            last_match_date: None,
            active: true,
            matches: Vec::new(),
        }
    }

    pub fn matches_played(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn opponent_ref(&self) -> OpponentRef {
        OpponentRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Strip the leading `@` a handle is usually typed with
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_string()
}

/// Snapshot of the opponent at the time the match was recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentRef {
    pub id: PlayerId,
    pub name: String,
}

/// One entry of a player's match history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub timestamp: DateTime<Utc>,
    pub rating_change: f64,
    pub win_probability: f64,
    pub win: bool,
    pub sets_won: u32,
    pub sets_lost: u32,
    /// Games listed from this player's side first
    pub score: String,
    pub opponent: OpponentRef,
    pub label: Option<String>,
}

/// Games won by each side in one set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub first: u32,
    pub second: u32,
}

impl SetScore {
    pub fn new(first: u32, second: u32) -> Self {
        Self { first, second }
    }

    pub fn flipped(&self) -> Self {
        Self {
            first: self.second,
            second: self.first,
        }
    }
}

impl fmt::Display for SetScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

pub fn format_sets(sets: &[SetScore]) -> String {
    sets.iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decided match, sets listed from the winner's side
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub winner: Player,
    pub loser: Player,
    pub winner_sets_won: u32,
    pub loser_sets_won: u32,
    pub sets: Vec<SetScore>,
    pub label: Option<String>,
}

impl MatchResult {
    pub fn winner_score(&self) -> String {
        format_sets(&self.sets)
    }

    pub fn loser_score(&self) -> String {
        let flipped: Vec<SetScore> = self.sets.iter().map(SetScore::flipped).collect();
        format_sets(&flipped)
    }
}
