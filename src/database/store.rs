use anyhow::Result;
use std::time::Duration;

use super::connection::{create_memory_pool, create_pool, get_connection, DbPool};
use super::{players, setup};
use crate::config::StoreSettings;
use crate::domain::{normalize_handle, MatchUpdate, Player, PlayerId};

/// Persistence boundary for player profiles and their match history
pub trait PlayerStore: Send + Sync {
    fn get_by_id(&self, id: PlayerId) -> Result<Option<Player>>;

    fn get_by_handle(&self, handle: &str) -> Result<Option<Player>>;

    fn create(&self, player: &Player) -> Result<()>;

    /// Applies the rating delta and appends the record atomically for one player
    fn update_after_match(&self, id: PlayerId, update: &MatchUpdate) -> Result<Player>;

    fn list_active_ordered_by_rating_desc(&self) -> Result<Vec<Player>>;

    /// Returns false when no such player exists
    fn set_active(&self, id: PlayerId, active: bool) -> Result<bool>;
}

pub struct SqlitePlayerStore {
    pool: DbPool,
    update_retries: usize,
}

impl SqlitePlayerStore {
    pub fn new(pool: DbPool, update_retries: usize) -> Self {
        Self {
            pool,
            update_retries,
        }
    }

    /// Opens the database file and makes sure the schema is in place
    pub fn open(settings: &StoreSettings) -> Result<Self> {
        let pool = create_pool(
            &settings.database_path,
            Duration::from_millis(settings.busy_timeout_ms),
        )?;
        Self::initialized(pool, settings.update_retries)
    }

    pub fn in_memory() -> Result<Self> {
        let pool = create_memory_pool()?;
        Self::initialized(pool, 3)
    }

    fn initialized(pool: DbPool, update_retries: usize) -> Result<Self> {
        let conn = get_connection(&pool)?;
        setup::ensure_schema(&conn)?;
        drop(conn);
        Ok(Self::new(pool, update_retries))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl PlayerStore for SqlitePlayerStore {
    fn get_by_id(&self, id: PlayerId) -> Result<Option<Player>> {
        let conn = get_connection(&self.pool)?;
        players::find_by_id(&conn, id)
    }

    fn get_by_handle(&self, handle: &str) -> Result<Option<Player>> {
        let conn = get_connection(&self.pool)?;
        players::find_by_handle(&conn, &normalize_handle(handle))
    }

    fn create(&self, player: &Player) -> Result<()> {
        let conn = get_connection(&self.pool)?;
        players::insert_player(&conn, player)
    }

    fn update_after_match(&self, id: PlayerId, update: &MatchUpdate) -> Result<Player> {
        let mut conn = get_connection(&self.pool)?;
        players::update_after_match(&mut conn, id, update, self.update_retries)
    }

    fn list_active_ordered_by_rating_desc(&self) -> Result<Vec<Player>> {
        let conn = get_connection(&self.pool)?;
        players::list_active_by_rating(&conn)
    }

    fn set_active(&self, id: PlayerId, active: bool) -> Result<bool> {
        let conn = get_connection(&self.pool)?;
        players::set_active(&conn, id, active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MatchRecord, OpponentRef};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap()
    }

    fn store_with(players: &[(PlayerId, &str, f64)]) -> SqlitePlayerStore {
        let store = SqlitePlayerStore::in_memory().unwrap();
        for (id, name, rating) in players {
            let mut player = Player::new(*id, name, Some(name.to_lowercase().as_str()), *rating, at(1));
            player.highest_rating = *rating;
            store.create(&player).unwrap();
        }
        store
    }

    fn win_update(delta: f64, opponent: PlayerId, day: u32) -> MatchUpdate {
        MatchUpdate {
            rating_delta: delta,
            record: MatchRecord {
                timestamp: at(day),
                rating_change: delta,
                win_probability: 0.5,
                win: delta >= 0.0,
                sets_won: if delta >= 0.0 { 2 } else { 0 },
                sets_lost: if delta >= 0.0 { 0 } else { 2 },
                score: "6-2 6-2".to_string(),
                opponent: OpponentRef {
                    id: opponent,
                    name: "Opponent".to_string(),
                },
                label: Some("League".to_string()),
            },
        }
    }

    #[test]
    fn test_create_and_lookup() {
        let store = store_with(&[(1, "Alice", 1200.0)]);

        let by_id = store.get_by_id(1).unwrap().unwrap();
        assert_eq!(by_id.name, "Alice");
        assert_eq!(by_id.joined_at, at(1));
        assert!(by_id.matches.is_empty());

        let by_handle = store.get_by_handle("@ALICE").unwrap().unwrap();
        assert_eq!(by_handle.id, 1);

        assert!(store.get_by_id(2).unwrap().is_none());
        assert!(store.get_by_handle("bob").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let store = store_with(&[(1, "Alice", 1200.0)]);
        let again = Player::new(1, "Alice", None, 1200.0, at(2));
        assert!(store.create(&again).is_err());
    }

    #[test]
    fn test_update_after_match_persists_everything() {
        let store = store_with(&[(1, "Alice", 1200.0), (2, "Bob", 1200.0)]);

        let updated = store.update_after_match(1, &win_update(16.0, 2, 3)).unwrap();
        assert_eq!(updated.rating, 1216.0);

        let stored = store.get_by_id(1).unwrap().unwrap();
        assert_eq!(stored, updated);
        assert_eq!(stored.highest_rating, 1216.0);
        assert_eq!(stored.wins, 1);
        assert_eq!(stored.matches_played(), 1);
        assert_eq!(stored.last_match_date, Some(at(3)));
        assert_eq!(stored.matches.len(), 1);
        assert_eq!(stored.matches[0].label.as_deref(), Some("League"));
    }

    #[test]
    fn test_updates_accumulate_from_stored_state() {
        let store = store_with(&[(1, "Alice", 1200.0), (2, "Bob", 1200.0)]);

        store.update_after_match(1, &win_update(16.0, 2, 3)).unwrap();
        store.update_after_match(1, &win_update(-10.0, 2, 4)).unwrap();

        let stored = store.get_by_id(1).unwrap().unwrap();
        assert_eq!(stored.rating, 1206.0);
        assert_eq!(stored.highest_rating, 1216.0);
        assert_eq!((stored.wins, stored.losses), (1, 1));
        assert_eq!(stored.matches[0].timestamp, at(3));
        assert_eq!(stored.matches[1].timestamp, at(4));
    }

    #[test]
    fn test_update_unknown_player_fails() {
        let store = store_with(&[]);
        assert!(store.update_after_match(9, &win_update(16.0, 2, 3)).is_err());
    }

    fn file_store(name: &str, update_retries: usize, busy_timeout_ms: u64) -> (SqlitePlayerStore, String) {
        let path = std::env::temp_dir()
            .join(format!("tennis_ladder_{}_{}.db", name, std::process::id()))
            .to_string_lossy()
            .into_owned();
        let _ = std::fs::remove_file(&path);

        let settings = StoreSettings {
            database_path: path.clone(),
            update_retries,
            busy_timeout_ms,
        };
        let store = SqlitePlayerStore::open(&settings).unwrap();
        store
            .create(&Player::new(1, "Alice", Some("alice"), 1200.0, at(1)))
            .unwrap();
        (store, path)
    }

    #[test]
    fn test_locked_update_fails_without_partial_write() {
        let (store, path) = file_store("locked", 2, 20);

        let blocker = rusqlite::Connection::open(&path).unwrap();
        blocker.execute_batch("BEGIN IMMEDIATE;").unwrap();

        let err = store.update_after_match(1, &win_update(16.0, 2, 3)).unwrap_err();
        assert!(players::is_lock_contention(&err));

        let stored = store.get_by_id(1).unwrap().unwrap();
        assert_eq!(stored.wins, 0);
        assert!(stored.matches.is_empty());

        blocker.execute_batch("ROLLBACK;").unwrap();
        let updated = store.update_after_match(1, &win_update(16.0, 2, 3)).unwrap();
        assert_eq!(updated.wins, 1);

        drop(blocker);
        drop(store);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_locked_update_is_retried_until_released() {
        let (store, path) = file_store("retried", 50, 10);

        let blocker = rusqlite::Connection::open(&path).unwrap();
        blocker.execute_batch("BEGIN IMMEDIATE;").unwrap();
        let release = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(60));
            blocker.execute_batch("ROLLBACK;").unwrap();
        });

        let updated = store.update_after_match(1, &win_update(16.0, 2, 3)).unwrap();
        release.join().unwrap();

        assert_eq!(updated.rating, 1216.0);
        assert_eq!(store.get_by_id(1).unwrap().unwrap().matches.len(), 1);

        drop(store);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_lock_contention_is_recognised() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let err = anyhow::Error::new(busy).context("Failed to begin player update");
        assert!(players::is_lock_contention(&err));

        assert!(!players::is_lock_contention(&anyhow::anyhow!("Player 9 does not exist")));
    }

    #[test]
    fn test_ranking_order_and_deactivation() {
        let store = store_with(&[(1, "Cara", 1250.0), (2, "Abe", 1300.0), (3, "Bea", 1250.0)]);

        let ids: Vec<PlayerId> = store
            .list_active_ordered_by_rating_desc()
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);

        assert!(store.set_active(2, false).unwrap());
        assert!(!store.set_active(42, false).unwrap());

        let ids: Vec<PlayerId> = store
            .list_active_ordered_by_rating_desc()
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);

        // History survives deactivation
        assert!(store.get_by_id(2).unwrap().is_some());
    }

    #[test]
    fn test_listing_attaches_histories() {
        let store = store_with(&[(1, "Alice", 1200.0), (2, "Bob", 1200.0)]);
        store.update_after_match(1, &win_update(16.0, 2, 3)).unwrap();
        store.update_after_match(2, &win_update(-16.0, 1, 3)).unwrap();

        let players = store.list_active_ordered_by_rating_desc().unwrap();
        assert_eq!(players[0].id, 1);
        assert_eq!(players[0].matches.len(), 1);
        assert_eq!(players[1].matches.len(), 1);
        assert!(!players[1].matches[0].win);
    }
}
