use log::info;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::PlayerStore;
use crate::domain::{Clock, Player, PlayerId};
use crate::errors::{BotError, BotResult};
use crate::stats::{build_rankings, RankingEntry};

/// Registration, profile lookups and the leaderboard
pub struct PlayerService {
    store: Arc<dyn PlayerStore>,
    clock: Arc<dyn Clock>,
    config: Arc<AppConfig>,
}

impl PlayerService {
    pub fn new(store: Arc<dyn PlayerStore>, clock: Arc<dyn Clock>, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn register(&self, id: PlayerId, name: &str, handle: Option<&str>) -> BotResult<Player> {
        if self.store.get_by_id(id)?.is_some() {
            return Err(BotError::AlreadyRegistered);
        }

        let player = Player::new(
            id,
            name,
            handle,
            self.config.rating.starter_rating,
            self.clock.now(),
        );
        self.store.create(&player)?;

        info!("Registered player {} ({})", player.name, player.id);
        Ok(player)
    }

    pub fn is_registered(&self, id: PlayerId) -> BotResult<bool> {
        Ok(self.store.get_by_id(id)?.is_some())
    }

    pub fn profile(&self, id: PlayerId) -> BotResult<Player> {
        self.store.get_by_id(id)?.ok_or(BotError::NotRegistered)
    }

    pub fn profile_by_handle(&self, handle: &str) -> BotResult<Player> {
        self.store
            .get_by_handle(handle)?
            .ok_or_else(|| BotError::PlayerNotFound(handle.to_string()))
    }

    pub fn rankings(&self) -> BotResult<Vec<RankingEntry>> {
        let players = self.store.list_active_ordered_by_rating_desc()?;
        Ok(build_rankings(&players, self.config.report.form_window))
    }

    /// Soft (de)activation; history is kept either way
    pub fn set_active(&self, handle: &str, active: bool) -> BotResult<Player> {
        let player = self.profile_by_handle(handle)?;
        self.store.set_active(player.id, active)?;

        info!(
            "Player {} ({}) is now {}",
            player.name,
            player.id,
            if active { "active" } else { "inactive" }
        );
        self.profile(player.id)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
