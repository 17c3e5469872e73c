use anyhow::{Context, Result};
use regex::Regex;

use crate::config::TiePolicy;
use crate::domain::{MatchResult, Player, SetScore};
use crate::errors::ParseError;

const MAX_SETS: usize = 3;

/// First named side of a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerSlot {
    /// `@opponent 6-2 6-2`: the sender played the match
    Reporter,
    /// `@player - @opponent 6-2 6-2`
    Handle(String),
}

/// Structured form of a match report, before players are looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReport {
    pub player: PlayerSlot,
    pub opponent: String,
    /// Games listed from the first side's point of view
    pub sets: Vec<SetScore>,
    pub label: Option<String>,
}

impl ParsedReport {
    pub fn reporter_is_player(&self) -> bool {
        self.player == PlayerSlot::Reporter
    }
}

/// Grammar for `[@player - ]@opponent <set> [<set> [<set>]] [#label]`
pub struct ScoreParser {
    report_regex: Regex,
    set_regex: Regex,
}

impl ScoreParser {
    pub fn new() -> Result<Self> {
        let report_regex = Self::compile_report_regex()?;
        let set_regex = Self::compile_set_regex()?;

        Ok(Self {
            report_regex,
            set_regex,
        })
    }

    // --- Construction Helpers ---

    fn compile_report_regex() -> Result<Regex> {
        Regex::new(
            r"(?s)^(?:@(?P<player>[A-Za-z0-9_]+)\s*-\s*)?@(?P<opponent>[A-Za-z0-9_]+)(?P<rest>(?:\s.*)?)$",
        )
        .context("Failed to compile match report regex")
    }

    fn compile_set_regex() -> Result<Regex> {
        Regex::new(r"^(?P<first>[0-9]+)-(?P<second>[0-9]+)$")
            .context("Failed to compile set score regex")
    }

    // --- Parsing ---

    pub fn parse_report(&self, input: &str) -> Result<ParsedReport, ParseError> {
        let captures = self
            .report_regex
            .captures(input.trim())
            .ok_or(ParseError::UnknownFormat)?;

        let opponent = captures
            .name("opponent")
            .map(|m| m.as_str().to_string())
            .ok_or(ParseError::UnknownFormat)?;

        let player = match captures.name("player") {
            Some(m) => PlayerSlot::Handle(m.as_str().to_string()),
            None => PlayerSlot::Reporter,
        };

        if let PlayerSlot::Handle(handle) = &player {
            if handle.eq_ignore_ascii_case(&opponent) {
                return Err(ParseError::SelfMatch);
            }
        }

        let rest = captures.name("rest").map_or("", |m| m.as_str());
        let (score, label) = split_label(rest)?;
        let sets = self.parse_sets(score)?;

        Ok(ParsedReport {
            player,
            opponent,
            sets,
            label,
        })
    }

    /// Parses 1-3 whitespace separated `int-int` tokens
    pub fn parse_sets(&self, score: &str) -> Result<Vec<SetScore>, ParseError> {
        let sets = score
            .split_whitespace()
            .map(|token| self.parse_set(token))
            .collect::<Result<Vec<_>, _>>()?;

        if sets.is_empty() || sets.len() > MAX_SETS {
            return Err(ParseError::MalformedScore);
        }

        Ok(sets)
    }

    fn parse_set(&self, token: &str) -> Result<SetScore, ParseError> {
        let captures = self
            .set_regex
            .captures(token)
            .ok_or(ParseError::MalformedScore)?;

        let first = parse_games(captures.name("first").map(|m| m.as_str()))?;
        let second = parse_games(captures.name("second").map(|m| m.as_str()))?;
        Ok(SetScore::new(first, second))
    }
}

fn parse_games(value: Option<&str>) -> Result<u32, ParseError> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or(ParseError::MalformedScore)
}

/// Separates a trailing `#label` token from the score
fn split_label(rest: &str) -> Result<(&str, Option<String>), ParseError> {
    let rest = rest.trim();

    let (score, label) = match rest.rsplit_once(char::is_whitespace) {
        Some((score, last)) if last.starts_with('#') => (score, Some(last)),
        None if rest.starts_with('#') => ("", Some(rest)),
        _ => (rest, None),
    };

    // A label anywhere but last, or an empty one, is not part of the grammar
    if score.contains('#') {
        return Err(ParseError::MalformedScore);
    }

    let label = match label {
        Some(raw) => {
            let name = raw.trim_start_matches('#');
            if name.is_empty() {
                return Err(ParseError::MalformedScore);
            }
            Some(name.to_string())
        }
        None => None,
    };

    Ok((score, label))
}

/// Counts sets won by each side; drawn sets count for neither
pub fn count_sets(sets: &[SetScore]) -> (u32, u32) {
    sets.iter().fold((0, 0), |(first, second), set| {
        if set.first > set.second {
            (first + 1, second)
        } else if set.second > set.first {
            (first, second + 1)
        } else {
            (first, second)
        }
    })
}

/// Decides winner and loser of a parsed report between two resolved players
pub fn decide_match(
    first: Player,
    second: Player,
    sets: &[SetScore],
    label: Option<String>,
    tie_policy: TiePolicy,
) -> Result<MatchResult, ParseError> {
    if first.id == second.id {
        return Err(ParseError::SelfMatch);
    }

    let (first_sets, second_sets) = count_sets(sets);

    let first_wins = match first_sets.cmp(&second_sets) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => match tie_policy {
            TiePolicy::Reject => return Err(ParseError::TiedSets),
            TiePolicy::SecondNamedWins => false,
        },
    };

    let result = if first_wins {
        MatchResult {
            winner: first,
            loser: second,
            winner_sets_won: first_sets,
            loser_sets_won: second_sets,
            sets: sets.to_vec(),
            label,
        }
    } else {
        MatchResult {
            winner: second,
            loser: first,
            winner_sets_won: second_sets,
            loser_sets_won: first_sets,
            sets: sets.iter().map(SetScore::flipped).collect(),
            label,
        }
    };

    Ok(result)
}
