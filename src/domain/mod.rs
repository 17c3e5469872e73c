pub mod clock;
pub mod models;
pub mod profile;

pub use clock::{Clock, FixedClock, SystemClock};
pub use models::{
    format_sets, normalize_handle, MatchRecord, MatchResult, OpponentRef, Player, PlayerId,
    SetScore,
};
pub use profile::{apply_update, build_updates, MatchUpdate};
