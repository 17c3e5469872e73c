use serde::Serialize;

use crate::stats::{ActivityYear, PlayerSummary, RankingEntry};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingsResponse {
    pub items: Vec<RankingEntry>,
    pub total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetail {
    #[serde(flatten)]
    pub summary: PlayerSummary,
    pub activity: Vec<ActivityYear>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
