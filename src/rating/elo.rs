use super::types::{EloOutcome, RatingValue};

/// Rating difference that corresponds to 10:1 odds
const SCALE: f64 = 400.0;

/// Computes the Elo outcome of `winner` beating `loser`
pub fn calculate_elo(winner: RatingValue, loser: RatingValue, k_factor: f64) -> EloOutcome {
    let winner_expected = expected_score(winner, loser);
    let loser_expected = expected_score(loser, winner);

    EloOutcome {
        winner_expected,
        loser_expected,
        winner_gain: k_factor * (1.0 - winner_expected),
        loser_loss: k_factor * (0.0 - loser_expected),
    }
}

/// Probability that a player rated `rating` beats one rated `opponent`
pub fn expected_score(rating: RatingValue, opponent: RatingValue) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((opponent - rating) / SCALE))
}
