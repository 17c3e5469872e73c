pub mod activity;
pub mod form;
pub mod ranking;
pub mod summary;

pub use activity::{group_activity, ActivityEntry, ActivityGroup, ActivityYear};
pub use form::{format_rating, format_signed, rating_change, recent_form};
pub use ranking::{build_rankings, RankingEntry};
pub use summary::{summarize, PlayerSummary};
