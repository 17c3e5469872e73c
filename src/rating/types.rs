pub type RatingValue = f64;

/// Expected scores and rating deltas for one decided match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloOutcome {
    pub winner_expected: f64,
    pub loser_expected: f64,
    /// Always >= 0
    pub winner_gain: RatingValue,
    /// Always <= 0
    pub loser_loss: RatingValue,
}
