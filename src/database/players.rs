use anyhow::{Context, Result};
use log::warn;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use super::connection::DbConn;
use super::matches;
use super::models::PlayerRow;
use crate::domain::{apply_update, MatchUpdate, Player, PlayerId};

const SELECT_COLUMNS: &str = "id, name, handle, rating, highest_rating, wins, losses, joined_at, last_match_date, active";

pub fn insert_player(conn: &Connection, player: &Player) -> Result<()> {
    let sql = "INSERT INTO players (id, name, handle, rating, highest_rating, wins, losses, joined_at, last_match_date, active) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

    conn.execute(
        sql,
        params![
            player.id,
            player.name,
            player.handle,
            player.rating,
            player.highest_rating,
            player.wins,
            player.losses,
            player.joined_at,
            player.last_match_date,
            player.active
        ],
    )
    .with_context(|| format!("Failed to insert player {}", player.id))
    .map(|_| ())
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<PlayerRow> {
    Ok(PlayerRow {
        id: row.get(0)?,
        name: row.get(1)?,
        handle: row.get(2)?,
        rating: row.get(3)?,
        highest_rating: row.get(4)?,
        wins: row.get(5)?,
        losses: row.get(6)?,
        joined_at: row.get(7)?,
        last_match_date: row.get(8)?,
        active: row.get(9)?,
    })
}

fn find_row_by_id(conn: &Connection, id: PlayerId) -> Result<Option<PlayerRow>> {
    let sql = format!("SELECT {} FROM players WHERE id = ?1", SELECT_COLUMNS);

    conn.query_row(&sql, params![id], parse_player_row)
        .optional()
        .context("Failed to query player by id")
}

fn attach_history(conn: &Connection, row: PlayerRow) -> Result<Player> {
    let history = matches::list_for_player(conn, row.id)?;
    row.into_player(history)
}

pub fn find_by_id(conn: &Connection, id: PlayerId) -> Result<Option<Player>> {
    find_row_by_id(conn, id)?
        .map(|row| attach_history(conn, row))
        .transpose()
}

/// Handles are matched case-insensitively
pub fn find_by_handle(conn: &Connection, handle: &str) -> Result<Option<Player>> {
    let sql = format!(
        "SELECT {} FROM players WHERE handle = ?1 ORDER BY id LIMIT 1",
        SELECT_COLUMNS
    );

    conn.query_row(&sql, params![handle], parse_player_row)
        .optional()
        .context("Failed to query player by handle")?
        .map(|row| attach_history(conn, row))
        .transpose()
}

/// Active players, highest rating first; equal ratings keep registration order
pub fn list_active_by_rating(conn: &Connection) -> Result<Vec<Player>> {
    let sql = format!(
        "SELECT {} FROM players WHERE active = 1 ORDER BY rating DESC, joined_at, id",
        SELECT_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut histories = matches::list_for_active_players(conn)?;

    rows.into_iter()
        .map(|row| {
            let history = histories.remove(&row.id).unwrap_or_default();
            row.into_player(history)
        })
        .collect()
}

pub fn set_active(conn: &Connection, id: PlayerId, active: bool) -> Result<bool> {
    let sql = "UPDATE players SET active = ?1 WHERE id = ?2";

    conn.execute(sql, params![active, id])
        .context("Failed to update player activation")
        .map(|changed| changed > 0)
}

/// Applies a match to the stored player.
///
/// Read, update and record insert run in one IMMEDIATE transaction, which
/// holds the write lock from the first read, so concurrent updates of the
/// same player cannot interleave. An attempt that finds the database locked
/// by another writer (after the connection's busy timeout) is retried, up to
/// `retries` attempts in total; every other failure is returned at once.
pub fn update_after_match(
    conn: &mut DbConn,
    id: PlayerId,
    update: &MatchUpdate,
    retries: usize,
) -> Result<Player> {
    let attempts = retries.max(1);
    let mut attempt = 1;

    loop {
        match try_update_after_match(conn, id, update) {
            Err(e) if attempt < attempts && is_lock_contention(&e) => {
                warn!(
                    "Database locked while updating player {} (attempt {}/{})",
                    id, attempt, attempts
                );
                attempt += 1;
            }
            Err(e) if is_lock_contention(&e) => {
                return Err(e.context(format!(
                    "Gave up updating player {} after {} locked attempts",
                    id, attempts
                )));
            }
            result => return result,
        }
    }
}

/// True when the failure is SQLite reporting another writer holding the lock
pub fn is_lock_contention(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::SqliteFailure(e, _))
                if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        )
    })
}

fn try_update_after_match(conn: &mut DbConn, id: PlayerId, update: &MatchUpdate) -> Result<Player> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("Failed to begin player update")?;

    let row = find_row_by_id(&tx, id)?
        .ok_or_else(|| anyhow::anyhow!("Player {} does not exist", id))?;

    let mut player = attach_history(&tx, row)?;
    apply_update(&mut player, update);

    let sql = "UPDATE players SET rating = ?1, highest_rating = ?2, wins = ?3, losses = ?4, last_match_date = ?5 WHERE id = ?6";
    tx.execute(
        sql,
        params![
            player.rating,
            player.highest_rating,
            player.wins,
            player.losses,
            player.last_match_date,
            id
        ],
    )
    .context("Failed to update player after match")?;

    matches::insert_record(&tx, id, &update.record)?;
    tx.commit().context("Failed to commit player update")?;

    Ok(player)
}
