use crate::domain::MatchRecord;

pub const WIN_GLYPH: &str = "🟢";
pub const LOSS_GLYPH: &str = "🔴";

/// The last `window` matches, oldest first
fn trailing(matches: &[MatchRecord], window: usize) -> &[MatchRecord] {
    &matches[matches.len().saturating_sub(window)..]
}

pub fn outcome_glyph(win: bool) -> &'static str {
    if win { WIN_GLYPH } else { LOSS_GLYPH }
}

/// Win/loss glyphs over the trailing window; empty without matches
pub fn recent_form(matches: &[MatchRecord], window: usize) -> String {
    trailing(matches, window)
        .iter()
        .map(|m| outcome_glyph(m.win))
        .collect()
}

/// Net rating change over the trailing window
pub fn rating_change(matches: &[MatchRecord], window: usize) -> f64 {
    trailing(matches, window)
        .iter()
        .map(|m| m.rating_change)
        .sum()
}

pub fn format_rating(value: f64) -> String {
    format!("{:.2}", value)
}

/// Two decimals with an explicit sign
pub fn format_signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}", value.abs())
    } else {
        format!("{:.2}", value)
    }
}
