pub mod parser;

pub use parser::{count_sets, decide_match, ParsedReport, PlayerSlot, ScoreParser};
