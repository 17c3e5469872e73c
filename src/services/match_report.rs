use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::PlayerStore;
use crate::domain::{build_updates, Clock, MatchResult, Player, PlayerId};
use crate::errors::{BotError, BotResult, ParseError};
use crate::rating::{calculate_elo, EloOutcome};
use crate::scoring::{decide_match, ParsedReport, PlayerSlot, ScoreParser};

/// A match that was parsed, rated and written to both profiles
#[derive(Debug, Clone)]
pub struct RecordedMatch {
    /// Players as they were before the match
    pub result: MatchResult,
    pub elo: EloOutcome,
    pub winner: Player,
    pub loser: Player,
}

/// Turns a free-text report into rating updates for both players
pub struct MatchReportService {
    store: Arc<dyn PlayerStore>,
    clock: Arc<dyn Clock>,
    config: Arc<AppConfig>,
    parser: ScoreParser,
}

impl MatchReportService {
    pub fn new(
        store: Arc<dyn PlayerStore>,
        clock: Arc<dyn Clock>,
        config: Arc<AppConfig>,
    ) -> Result<Self> {
        Ok(Self {
            store,
            clock,
            config,
            parser: ScoreParser::new()?,
        })
    }

    /// Parses, rates and records a report sent by `reporter_id`
    pub fn report(&self, reporter_id: PlayerId, input: &str) -> BotResult<RecordedMatch> {
        let parsed = self.parser.parse_report(input).inspect_err(|e| {
            warn!("Rejected match report from {}: {} ({:?})", reporter_id, e, input);
        })?;

        let result = self.resolve(reporter_id, parsed)?;
        self.record(result)
    }

    fn resolve(&self, reporter_id: PlayerId, parsed: ParsedReport) -> BotResult<MatchResult> {
        let first = match &parsed.player {
            PlayerSlot::Reporter => self
                .store
                .get_by_id(reporter_id)?
                .ok_or(BotError::NotRegistered)?,
            PlayerSlot::Handle(handle) => self.find_by_handle(handle)?,
        };
        let second = self.find_by_handle(&parsed.opponent)?;

        let result = decide_match(
            first,
            second,
            &parsed.sets,
            parsed.label,
            self.config.report.tie_policy,
        )?;
        Ok(result)
    }

    fn find_by_handle(&self, handle: &str) -> BotResult<Player> {
        self.store
            .get_by_handle(handle)?
            .ok_or_else(|| BotError::PlayerNotFound(handle.to_string()))
    }

    /// Rates the match and applies it to the winner, then the loser.
    ///
    /// The two writes are independent: if the loser update fails after the
    /// winner was written, the error names both players so the match can be
    /// reconciled by hand.
    pub fn record(&self, result: MatchResult) -> BotResult<RecordedMatch> {
        if result.winner.id == result.loser.id {
            return Err(ParseError::SelfMatch.into());
        }

        let elo = calculate_elo(
            result.winner.rating,
            result.loser.rating,
            self.config.rating.k_factor,
        );
        let (winner_update, loser_update) = build_updates(&result, &elo, self.clock.now());

        let winner = self
            .store
            .update_after_match(result.winner.id, &winner_update)
            .inspect_err(|e| error!("Failed to update winner {}: {:#}", result.winner.id, e))?;

        let loser = match self.store.update_after_match(result.loser.id, &loser_update) {
            Ok(loser) => loser,
            Err(source) => {
                error!(
                    "Match {} def. {} applied to the winner only, manual reconciliation required: {:#}",
                    result.winner.id, result.loser.id, source
                );
                return Err(BotError::PartialUpdate {
                    winner: result.winner.id,
                    loser: result.loser.id,
                    source,
                });
            }
        };

        info!(
            "Recorded {} def. {} {} ({:+.2} / {:+.2})",
            winner.name,
            loser.name,
            result.winner_score(),
            elo.winner_gain,
            elo.loser_loss
        );

        Ok(RecordedMatch {
            result,
            elo,
            winner,
            loser,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TiePolicy;
    use crate::database::SqlitePlayerStore;
    use crate::domain::{FixedClock, MatchUpdate};
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 4, 19, 0, 0).unwrap()
    }

    fn seeded_store() -> Arc<SqlitePlayerStore> {
        let store = SqlitePlayerStore::in_memory().unwrap();
        for (id, name) in [(1, "Alice"), (2, "Bob"), (3, "Cara")] {
            let player = Player::new(id, name, Some(name.to_lowercase().as_str()), 1200.0, now());
            store.create(&player).unwrap();
        }
        Arc::new(store)
    }

    fn service_with(store: Arc<dyn PlayerStore>, config: AppConfig) -> MatchReportService {
        MatchReportService::new(store, Arc::new(FixedClock(now())), Arc::new(config)).unwrap()
    }

    #[test]
    fn test_self_report_updates_both_players() {
        let store = seeded_store();
        let service = service_with(store.clone(), AppConfig::new());

        let recorded = service.report(1, "@bob 6-2 6-2").unwrap();
        assert_eq!(recorded.winner.id, 1);
        assert_eq!(recorded.winner.rating, 1216.0);
        assert_eq!(recorded.loser.rating, 1184.0);

        let alice = store.get_by_id(1).unwrap().unwrap();
        let bob = store.get_by_id(2).unwrap().unwrap();
        assert_eq!((alice.wins, alice.losses), (1, 0));
        assert_eq!((bob.wins, bob.losses), (0, 1));
        assert_eq!(alice.highest_rating, 1216.0);
        assert_eq!(bob.highest_rating, 1200.0);
        assert_eq!(alice.matches[0].score, "6-2 6-2");
        assert_eq!(bob.matches[0].score, "2-6 2-6");
        assert_eq!(bob.matches[0].opponent.name, "Alice");
        assert_eq!(alice.last_match_date, Some(now()));
    }

    #[test]
    fn test_third_party_report_with_reporter_losing_side() {
        let store = seeded_store();
        let service = service_with(store.clone(), AppConfig::new());

        let recorded = service.report(3, "@alice - @bob 2-6 6-3 4-6 #Club").unwrap();
        assert_eq!(recorded.winner.name, "Bob");
        assert_eq!(recorded.result.winner_sets_won, 2);
        assert_eq!(recorded.result.loser_sets_won, 1);
        assert_eq!(recorded.winner.matches[0].label.as_deref(), Some("Club"));

        let cara = store.get_by_id(3).unwrap().unwrap();
        assert_eq!(cara.matches_played(), 0);
    }

    #[test]
    fn test_ratings_sum_is_preserved() {
        let store = seeded_store();
        let service = service_with(store.clone(), AppConfig::new());

        service.report(1, "@bob 6-2 6-2").unwrap();
        service.report(2, "@cara 7-5 7-6").unwrap();
        service.report(3, "@alice 6-4 6-4").unwrap();

        let total: f64 = store
            .list_active_ordered_by_rating_desc()
            .unwrap()
            .iter()
            .map(|p| p.rating)
            .sum();
        assert!((total - 3600.0).abs() < 1e-9);
    }

    #[test]
    fn test_errors() {
        let store = seeded_store();
        let service = service_with(store.clone(), AppConfig::new());

        assert!(matches!(
            service.report(99, "@bob 6-2"),
            Err(BotError::NotRegistered)
        ));
        assert!(matches!(
            service.report(1, "@zed 6-2"),
            Err(BotError::PlayerNotFound(h)) if h == "zed"
        ));
        assert!(matches!(
            service.report(1, "@alice 6-2"),
            Err(BotError::Parse(ParseError::SelfMatch))
        ));
        assert!(matches!(
            service.report(1, "@bob 6-x"),
            Err(BotError::Parse(ParseError::MalformedScore))
        ));
        assert!(matches!(
            service.report(1, "bob 6-2"),
            Err(BotError::Parse(ParseError::UnknownFormat))
        ));
        assert!(matches!(
            service.report(1, "@bob 6-2 2-6"),
            Err(BotError::Parse(ParseError::TiedSets))
        ));

        // Nothing was written by any of the rejected reports
        let alice = store.get_by_id(1).unwrap().unwrap();
        assert_eq!(alice.matches_played(), 0);
        assert_eq!(alice.rating, 1200.0);
    }

    #[test]
    fn test_legacy_tie_policy() {
        let store = seeded_store();
        let mut config = AppConfig::new();
        config.report.tie_policy = TiePolicy::SecondNamedWins;
        let service = service_with(store, config);

        let recorded = service.report(1, "@bob 6-2 2-6").unwrap();
        assert_eq!(recorded.winner.id, 2);
    }

    /// Delegates to a real store but refuses updates for one player
    struct FailingUpdates {
        inner: Arc<SqlitePlayerStore>,
        failing_id: PlayerId,
    }

    impl PlayerStore for FailingUpdates {
        fn get_by_id(&self, id: PlayerId) -> Result<Option<Player>> {
            self.inner.get_by_id(id)
        }

        fn get_by_handle(&self, handle: &str) -> Result<Option<Player>> {
            self.inner.get_by_handle(handle)
        }

        fn create(&self, player: &Player) -> Result<()> {
            self.inner.create(player)
        }

        fn update_after_match(&self, id: PlayerId, update: &MatchUpdate) -> Result<Player> {
            if id == self.failing_id {
                anyhow::bail!("write rejected");
            }
            self.inner.update_after_match(id, update)
        }

        fn list_active_ordered_by_rating_desc(&self) -> Result<Vec<Player>> {
            self.inner.list_active_ordered_by_rating_desc()
        }

        fn set_active(&self, id: PlayerId, active: bool) -> Result<bool> {
            self.inner.set_active(id, active)
        }
    }

    #[test]
    fn test_loser_failure_is_partial_update() {
        let inner = seeded_store();
        let store = Arc::new(FailingUpdates {
            inner: inner.clone(),
            failing_id: 2,
        });
        let service = service_with(store, AppConfig::new());

        let result = service.report(1, "@bob 6-2 6-2");
        assert!(matches!(
            result,
            Err(BotError::PartialUpdate { winner: 1, loser: 2, .. })
        ));

        // The winner write stays in place for manual reconciliation
        assert_eq!(inner.get_by_id(1).unwrap().unwrap().wins, 1);
        assert_eq!(inner.get_by_id(2).unwrap().unwrap().losses, 0);
    }

    #[test]
    fn test_winner_failure_writes_nothing() {
        let inner = seeded_store();
        let store = Arc::new(FailingUpdates {
            inner: inner.clone(),
            failing_id: 1,
        });
        let service = service_with(store, AppConfig::new());

        assert!(matches!(
            service.report(1, "@bob 6-2 6-2"),
            Err(BotError::Persistence(_))
        ));
        assert_eq!(inner.get_by_id(2).unwrap().unwrap().losses, 0);
    }
}
