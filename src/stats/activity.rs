use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::MatchRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub opponent: String,
    pub win: bool,
    pub score: String,
}

/// Matches sharing one grouping label within a year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityGroup {
    pub label: String,
    pub entries: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityYear {
    pub year: i32,
    pub groups: Vec<ActivityGroup>,
}

/// Groups history by year (ascending), then by label in order of first
/// appearance. Unlabelled matches fall under `default_label`.
pub fn group_activity(matches: &[MatchRecord], default_label: &str) -> Vec<ActivityYear> {
    let mut years: BTreeMap<i32, Vec<ActivityGroup>> = BTreeMap::new();

    for record in matches {
        let label = record.label.as_deref().unwrap_or(default_label);
        let groups = years.entry(record.timestamp.year()).or_default();

        let entry = ActivityEntry {
            timestamp: record.timestamp,
            opponent: record.opponent.name.clone(),
            win: record.win,
            score: record.score.clone(),
        };

        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.entries.push(entry),
            None => groups.push(ActivityGroup {
                label: label.to_string(),
                entries: vec![entry],
            }),
        }
    }

    years
        .into_iter()
        .map(|(year, groups)| ActivityYear { year, groups })
        .collect()
}
