pub mod match_report;
pub mod players;
pub mod server;

pub use match_report::{MatchReportService, RecordedMatch};
pub use players::PlayerService;
pub use server::ServerService;
