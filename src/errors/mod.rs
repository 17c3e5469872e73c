use thiserror::Error;

use crate::domain::PlayerId;

/// Why a match report could not be understood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed-score")]
    MalformedScore,
    #[error("unknown-format")]
    UnknownFormat,
    #[error("self-match")]
    SelfMatch,
    #[error("tied-sets")]
    TiedSets,
}

/// Failures surfaced to chat users
#[derive(Debug, Error)]
pub enum BotError {
    #[error("player is not registered")]
    NotRegistered,
    #[error("player is already registered")]
    AlreadyRegistered,
    #[error("player not found: {0}")]
    PlayerNotFound(String),
    #[error("invalid match report: {0}")]
    Parse(#[from] ParseError),
    #[error("persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),
    #[error("winner {winner} updated but loser {loser} was not: {source:#}")]
    PartialUpdate {
        winner: PlayerId,
        loser: PlayerId,
        source: anyhow::Error,
    },
}

pub type BotResult<T> = std::result::Result<T, BotError>;
