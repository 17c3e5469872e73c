use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::collections::HashMap;

use super::models::{MatchRecordRow, MATCH_RECORD_SCHEMA_VERSION};
use crate::domain::{MatchRecord, PlayerId};

const SELECT_COLUMNS: &str = "id, player_id, schema_version, recorded_at, rating_change, win_probability, win, sets_won, sets_lost, score, opponent_id, opponent_name, label";

/// Appends a record to the player's history. Records are never updated.
pub fn insert_record(conn: &Connection, player_id: PlayerId, record: &MatchRecord) -> Result<()> {
    let sql = "INSERT INTO match_records (player_id, schema_version, recorded_at, rating_change, win_probability, win, sets_won, sets_lost, score, opponent_id, opponent_name, label) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

    conn.execute(
        sql,
        params![
            player_id,
            MATCH_RECORD_SCHEMA_VERSION,
            record.timestamp,
            record.rating_change,
            record.win_probability,
            record.win,
            record.sets_won,
            record.sets_lost,
            record.score,
            record.opponent.id,
            record.opponent.name,
            record.label
        ],
    )
    .context("Failed to insert match record")
    .map(|_| ())
}

fn parse_record_row(row: &rusqlite::Row) -> rusqlite::Result<MatchRecordRow> {
    Ok(MatchRecordRow {
        id: row.get(0)?,
        player_id: row.get(1)?,
        schema_version: row.get(2)?,
        recorded_at: row.get(3)?,
        rating_change: row.get(4)?,
        win_probability: row.get(5)?,
        win: row.get(6)?,
        sets_won: row.get(7)?,
        sets_lost: row.get(8)?,
        score: row.get(9)?,
        opponent_id: row.get(10)?,
        opponent_name: row.get(11)?,
        label: row.get(12)?,
    })
}

/// Chronological history of one player
pub fn list_for_player(conn: &Connection, player_id: PlayerId) -> Result<Vec<MatchRecord>> {
    let sql = format!(
        "SELECT {} FROM match_records WHERE player_id = ?1 ORDER BY id",
        SELECT_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![player_id], parse_record_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(MatchRecordRow::into_record)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Invalid match history for player {}", player_id))
}

/// Chronological histories of all active players, keyed by player
pub fn list_for_active_players(conn: &Connection) -> Result<HashMap<PlayerId, Vec<MatchRecord>>> {
    let sql = format!(
        "SELECT {} FROM match_records WHERE player_id IN (SELECT id FROM players WHERE active = 1) ORDER BY id",
        SELECT_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_record_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut histories: HashMap<PlayerId, Vec<MatchRecord>> = HashMap::new();
    for row in rows {
        let player_id = row.player_id;
        let record = row.into_record()?;
        histories.entry(player_id).or_default().push(record);
    }

    Ok(histories)
}
