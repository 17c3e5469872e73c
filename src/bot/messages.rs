use chrono::{DateTime, Utc};

use crate::domain::Player;
use crate::errors::{BotError, ParseError};
use crate::services::RecordedMatch;
use crate::stats::form::outcome_glyph;
use crate::stats::{format_rating, format_signed, ActivityYear, PlayerSummary, RankingEntry};

const NOT_AVAILABLE: &str = "n/a";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    /// Telegram legacy Markdown
    Markdown,
}

/// Text of one chat reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: TextFormat,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Plain,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Markdown,
        }
    }
}

fn is_markup(c: char) -> bool {
    matches!(c, '_' | '*' | '`' | '[')
}

/// Escapes the characters legacy Markdown treats as markup. Only valid
/// outside entities.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if is_markup(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Wraps `text` in a `marker` entity (`*` bold, `_` italic).
///
/// Legacy Markdown allows no escapes inside an entity, so the entity is
/// closed before each markup character and reopened after it:
/// `2*2=4` in bold becomes `*2*\**2=4*`.
pub fn entity(marker: char, text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    let mut run = String::new();

    for c in text.chars() {
        if is_markup(c) {
            push_run(&mut out, &mut run, marker);
            out.push('\\');
            out.push(c);
        } else {
            run.push(c);
        }
    }
    push_run(&mut out, &mut run, marker);

    out
}

fn push_run(out: &mut String, run: &mut String, marker: char) {
    if run.trim().is_empty() {
        out.push_str(run);
    } else {
        out.push(marker);
        out.push_str(run);
        out.push(marker);
    }
    run.clear();
}

fn bold(text: &str) -> String {
    entity('*', text)
}

fn italic(text: &str) -> String {
    entity('_', text)
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn or_not_available(text: &str) -> &str {
    if text.is_empty() { NOT_AVAILABLE } else { text }
}

// --- Onboarding ---

const COMMANDS: &str = "/register - join the ladder
/profile [@user] - rating and recent form
/activity [@user] - match history
/rankings - current leaderboard
/matchresult - report a match";

pub fn intro() -> Reply {
    Reply::plain(format!(
        "🎾 Welcome to the tennis ladder!\n\nRegister with /register to start collecting rating points.\n\n{}",
        COMMANDS
    ))
}

pub fn intro_registered(name: &str) -> Reply {
    Reply::plain(format!("🎾 Welcome back, {}!\n\n{}", name, COMMANDS))
}

pub fn help() -> Reply {
    Reply::plain(format!("Available commands:\n\n{}", COMMANDS))
}

pub fn registered(player: &Player) -> Reply {
    Reply::plain(format!(
        "Player {} registered with an initial rating of {}.",
        player.name,
        format_rating(player.rating)
    ))
}

pub fn already_registered() -> Reply {
    Reply::plain("You are already registered. Check out your stats with /profile.")
}

// --- Stats ---

pub fn profile(summary: &PlayerSummary, window: usize) -> Reply {
    let last_match = summary
        .last_match_date
        .map(format_date)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    Reply::markdown(format!(
        "👤 {name}\n\
         \n\
         Rating: *{rating}*\n\
         Last {window}: *{form}*\n\
         Change (last {window}): *{change}*\n\
         \n\
         High: *{high}*\n\
         W/L: *{wins}/{losses}*\n\
         \n\
         _Joined: {joined}_\n\
         _Last match: {last_match}_",
        name = bold(&summary.name),
        rating = format_rating(summary.rating),
        window = window,
        form = or_not_available(&summary.form),
        change = format_signed(summary.rating_change),
        high = format_rating(summary.highest_rating),
        wins = summary.wins,
        losses = summary.losses,
        joined = format_date(summary.joined_at),
        last_match = last_match,
    ))
}

pub fn activity(name: &str, years: &[ActivityYear]) -> Reply {
    let mut text = format!("📅 {}", bold(name));

    if years.is_empty() {
        text.push_str("\n\nNo matches yet.");
        return Reply::markdown(text);
    }

    for year in years {
        text.push_str(&format!("\n\n*{}*", year.year));
        for group in &year.groups {
            text.push_str(&format!("\n{}", italic(&group.label)));
            for entry in &group.entries {
                text.push_str(&format!(
                    "\n{} {} {}",
                    outcome_glyph(entry.win),
                    escape_markdown(&entry.opponent),
                    entry.score
                ));
            }
        }
    }

    Reply::markdown(text)
}

pub fn rankings(entries: &[RankingEntry], window: usize) -> Reply {
    if entries.is_empty() {
        return Reply::plain("No players registered yet.");
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            format!(
                "{}. {} - *{}* ({}) {}",
                entry.rank,
                escape_markdown(&entry.name),
                format_rating(entry.rating),
                format_signed(entry.rating_change),
                or_not_available(&entry.form)
            )
        })
        .collect();

    Reply::markdown(format!(
        "🎾 *Player Ratings*\n\n{}\n\n_Values in parentheses show the rating change over the last {} matches._",
        lines.join("\n"),
        window
    ))
}

// --- Match reports ---

pub fn match_report(recorded: &RecordedMatch) -> Reply {
    let winner = bold(&recorded.winner.name);
    let loser = bold(&recorded.loser.name);

    Reply::markdown(format!(
        "🏆 {winner} def. {loser} *{score}*.\n\
         \n\
         🔢 {winner} {winner_rating} *({winner_delta})* pts, {loser} {loser_rating} *({loser_delta})* pts.\n\
         \n\
         ✅ Result recorded.",
        winner = winner,
        loser = loser,
        score = recorded.result.winner_score(),
        winner_rating = format_rating(recorded.winner.rating),
        winner_delta = format_signed(recorded.elo.winner_gain),
        loser_rating = format_rating(recorded.loser.rating),
        loser_delta = format_signed(recorded.elo.loser_loss),
    ))
}

pub fn report_instructions() -> Reply {
    Reply::plain(
        "🔹 To report your match:\n@opponent 6-2 6-2 10-8\n\n\
         🔹 To report others:\n@player - @opponent 6-2 6-2 10-8\n\n\
         🔹 Add #Tournament at the end to group it.",
    )
}

pub fn group_chats_only() -> Reply {
    Reply::plain("This command can only be used in group chats.")
}

// --- Errors ---

fn parse_error(error: ParseError) -> &'static str {
    match error {
        ParseError::MalformedScore => {
            "Invalid score. Use 1 to 3 sets like 6-2 6-3, optionally followed by #Label."
        }
        ParseError::UnknownFormat => {
            "Invalid format. Please use:\n- @opponent 6-2 6-2\n- @player - @opponent 6-2 6-2 10-8"
        }
        ParseError::SelfMatch => "A player cannot play against themselves.",
        ParseError::TiedSets => "Both players won the same number of sets. Please check the score.",
    }
}

pub fn error(error: &BotError) -> Reply {
    let text = match error {
        BotError::NotRegistered => {
            "You are not registered as a player. Please use the /register command to register."
                .to_string()
        }
        BotError::AlreadyRegistered => return already_registered(),
        BotError::PlayerNotFound(handle) => {
            format!("Player @{} is not registered.", handle.trim_start_matches('@'))
        }
        BotError::Parse(e) => parse_error(*e).to_string(),
        BotError::Persistence(_) | BotError::PartialUpdate { .. } => {
            "Failed to record match. Please try again later.".to_string()
        }
    };

    Reply::plain(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MatchRecord, MatchResult, OpponentRef, SetScore};
    use crate::rating::calculate_elo;
    use crate::stats::{build_rankings, group_activity, summarize};
    use chrono::TimeZone;

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 18, 30, 0).unwrap()
    }

    fn record(win: bool, change: f64, month: u32, label: Option<&str>) -> MatchRecord {
        MatchRecord {
            timestamp: at(month, 1),
            rating_change: change,
            win_probability: 0.5,
            win,
            sets_won: if win { 2 } else { 0 },
            sets_lost: if win { 0 } else { 2 },
            score: if win { "6-3 6-4" } else { "3-6 4-6" }.to_string(),
            opponent: OpponentRef {
                id: 2,
                name: "Bob_B".to_string(),
            },
            label: label.map(str::to_string),
        }
    }

    fn seasoned_player() -> Player {
        let mut player = Player::new(1, "Ana *Ace*", Some("ana"), 1200.0, at(1, 10));
        player.matches = vec![
            record(true, 16.0, 2, None),
            record(false, -14.5, 3, Some("SummerCup")),
            record(true, 15.25, 4, None),
        ];
        player.rating = 1216.75;
        player.highest_rating = 1216.75;
        player.wins = 2;
        player.losses = 1;
        player.last_match_date = Some(at(4, 1));
        player
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b*c`d[e]"), "a\\_b\\*c\\`d\\[e]");
        assert_eq!(escape_markdown("Plain Name"), "Plain Name");
    }

    #[test]
    fn test_entities_never_contain_escapes() {
        assert_eq!(entity('*', "2*2=4"), "*2*\\**2=4*");
        assert_eq!(entity('_', "snake_case"), "_snake_\\__case_");
        assert_eq!(entity('_', "summer_cup"), "_summer_\\__cup_");
        assert_eq!(entity('*', "Plain Name"), "*Plain Name*");
        assert_eq!(entity('*', "*"), "\\*");
        assert_eq!(entity('*', ""), "");

        // Every backslash sits outside an entity: the marker count before it is even
        for text in ["Ana *Ace*", "_x_ [y] `z`", "a * b"] {
            let rendered = entity('*', text);
            let mut open = false;
            let mut chars = rendered.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        assert!(!open, "escape inside entity in {:?}", rendered);
                        chars.next();
                    }
                    '*' => open = !open,
                    _ => {}
                }
            }
            assert!(!open, "unclosed entity in {:?}", rendered);
        }
    }

    #[test]
    fn test_labels_with_underscores() {
        let mut player = seasoned_player();
        player.matches[1].label = Some("summer_cup".to_string());
        let reply = activity("Ana", &group_activity(&player.matches, "Friendlies"));

        assert!(reply.text.starts_with("📅 *Ana*\n"));
        assert!(reply.text.contains("\n_summer_\\__cup_\n🔴 Bob\\_B 3-6 4-6"));
    }

    #[test]
    fn test_profile() {
        let summary = summarize(&seasoned_player(), 5);
        let reply = profile(&summary, 5);

        assert_eq!(reply.format, TextFormat::Markdown);
        assert!(reply.text.starts_with("👤 *Ana *\\**Ace*\\*\n"));
        assert!(reply.text.contains("Rating: *1216.75*"));
        assert!(reply.text.contains("Last 5: *🟢🔴🟢*"));
        assert!(reply.text.contains("Change (last 5): *+16.75*"));
        assert!(reply.text.contains("W/L: *2/1*"));
        assert!(reply.text.contains("_Joined: 2024-01-10_"));
        assert!(reply.text.contains("_Last match: 2024-04-01_"));
    }

    #[test]
    fn test_profile_before_first_match() {
        let player = Player::new(1, "Newbie", None, 1200.0, at(1, 10));
        let reply = profile(&summarize(&player, 5), 5);

        assert!(reply.text.contains("Last 5: *n/a*"));
        assert!(reply.text.contains("Change (last 5): *+0.00*"));
        assert!(reply.text.contains("_Last match: n/a_"));
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let player = seasoned_player();

        let first = profile(&summarize(&player, 5), 5);
        let second = profile(&summarize(&player, 5), 5);
        assert_eq!(first, second);

        let rankings_once = rankings(&build_rankings(&[player.clone()], 5), 5);
        let rankings_twice = rankings(&build_rankings(&[player], 5), 5);
        assert_eq!(rankings_once, rankings_twice);
    }

    #[test]
    fn test_activity_groups() {
        let player = seasoned_player();
        let reply = activity(&player.name, &group_activity(&player.matches, "Friendlies"));

        let expected = "📅 *Ana *\\**Ace*\\*\n\n*2024*\n_Friendlies_\n🟢 Bob\\_B 6-3 6-4\n🟢 Bob\\_B 6-3 6-4\n_SummerCup_\n🔴 Bob\\_B 3-6 4-6";
        assert_eq!(reply.text, expected);

        let empty = activity("Newbie", &[]);
        assert!(empty.text.ends_with("No matches yet."));
    }

    #[test]
    fn test_rankings() {
        let mut second = Player::new(3, "Cara", None, 1200.0, at(1, 11));
        second.rating = 1190.0;
        let entries = build_rankings(&[seasoned_player(), second], 5);
        let reply = rankings(&entries, 5);

        assert!(reply.text.contains("1. Ana \\*Ace\\* - *1216.75* (+16.75) 🟢🔴🟢"));
        assert!(reply.text.contains("2. Cara - *1190.00* (+0.00) n/a"));
        assert_eq!(rankings(&[], 5).format, TextFormat::Plain);
    }

    #[test]
    fn test_match_report() {
        let ana = Player::new(1, "Ana", Some("ana"), 1200.0, at(1, 1));
        let bob = Player::new(2, "Bob", Some("bob"), 1200.0, at(1, 1));
        let elo = calculate_elo(1200.0, 1200.0, 32.0);

        let mut winner = ana.clone();
        winner.rating = 1216.0;
        let mut loser = bob.clone();
        loser.rating = 1184.0;

        let recorded = RecordedMatch {
            result: MatchResult {
                winner: ana,
                loser: bob,
                winner_sets_won: 2,
                loser_sets_won: 1,
                sets: vec![SetScore::new(6, 2), SetScore::new(3, 6), SetScore::new(10, 8)],
                label: None,
            },
            elo,
            winner,
            loser,
        };

        let reply = match_report(&recorded);
        assert!(reply.text.starts_with("🏆 *Ana* def. *Bob* *6-2 3-6 10-8*."));
        assert!(reply.text.contains("*Ana* 1216.00 *(+16.00)* pts, *Bob* 1184.00 *(-16.00)* pts."));
    }

    #[test]
    fn test_error_replies() {
        assert!(error(&BotError::NotRegistered).text.contains("/register"));
        assert_eq!(
            error(&BotError::PlayerNotFound("zed".to_string())).text,
            "Player @zed is not registered."
        );
        let partial = BotError::PartialUpdate {
            winner: 1,
            loser: 2,
            source: anyhow::anyhow!("locked"),
        };
        assert!(error(&partial).text.starts_with("Failed to record match"));
        assert!(error(&ParseError::TiedSets.into()).text.contains("same number of sets"));
    }
}
