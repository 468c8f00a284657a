use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{FixedGameSettings, GameSettings, DEFAULT_SLOT_COUNT, DEFAULT_STORAGE_KEY};

use super::{
    aggregator::ScopeAggregator, codec, extractor::GameOutcomeExtractor,
    normalize::normalize_snapshot, repository::StatsRepository, CompletedGame, Scope,
    ScopedRecord, Snapshot, StatsError,
};

/// What happened to a completed-game notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Nothing to record; stored state untouched
    Skipped,
    Recorded { scopes: Vec<Scope> },
    /// Aggregated but the write failed; the update is lost
    NotPersisted,
}

/// Loads, aggregates and persists the statistics snapshot.
///
/// Writes are serialized through `write_lock`; readers never take it and see
/// either the previous or the next persisted snapshot.
pub struct StatsService {
    repository: Arc<dyn StatsRepository>,
    settings: Arc<dyn GameSettings>,
    slot_count: usize,
    storage_key: String,
    write_lock: AsyncMutex<()>,
}

impl StatsService {
    pub fn builder(repository: Arc<dyn StatsRepository>) -> StatsServiceBuilder {
        StatsServiceBuilder::new(repository)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Always yields a normalized snapshot; storage and decode failures fall back to empty.
    #[instrument(skip(self))]
    pub async fn load_snapshot(&self) -> Snapshot {
        let total_blocks = self.settings.total_blocks();
        self.load_normalized(total_blocks).await
    }

    #[instrument(skip(self, game), fields(player_count = game.player_count))]
    pub async fn record_completed_game(&self, game: &CompletedGame) -> RecordOutcome {
        if game.is_empty() {
            debug!("Completed game has no players to record");
            return RecordOutcome::Skipped;
        }

        let total_blocks = self.settings.total_blocks();
        let deltas = GameOutcomeExtractor::new(total_blocks).extract(game);
        if deltas.is_empty() {
            return RecordOutcome::Skipped;
        }

        let _guard = self.write_lock.lock().await;

        let mut snapshot = self.load_normalized(total_blocks).await;
        let aggregator = ScopeAggregator::new(self.slot_count, total_blocks);

        let mut scopes = vec![Scope::AllGames];
        scopes.extend(Scope::for_player_count(game.seat_count()));

        for scope in &scopes {
            let records = std::mem::take(snapshot.records_mut(*scope));
            *snapshot.records_mut(*scope) = aggregator.apply(records, &deltas, game.seat_count());
        }

        let snapshot = normalize_snapshot(snapshot, self.slot_count, total_blocks);

        if let Err(err) = self.persist(&snapshot).await {
            error!(?err, "Failed to persist statistics; completed game dropped");
            return RecordOutcome::NotPersisted;
        }

        info!(
            players = deltas.len(),
            scopes = ?scopes,
            "Recorded completed game"
        );
        RecordOutcome::Recorded { scopes }
    }

    pub async fn scope_records(&self, scope: Scope) -> Vec<ScopedRecord> {
        let mut snapshot = self.load_snapshot().await;
        std::mem::take(snapshot.records_mut(scope))
    }

    /// `None` when `player_index` is outside the slot range
    pub async fn player_record(&self, scope: Scope, player_index: usize) -> Option<ScopedRecord> {
        self.load_snapshot()
            .await
            .record(scope, player_index)
            .cloned()
    }

    #[instrument(skip(self))]
    pub async fn reset_statistics(&self) -> Result<(), StatsError> {
        let _guard = self.write_lock.lock().await;
        self.repository.remove_blob(&self.storage_key).await?;
        info!("Statistics reset");
        Ok(())
    }

    async fn load_normalized(&self, total_blocks: usize) -> Snapshot {
        let stored = match self.repository.load_blob(&self.storage_key).await {
            Ok(Some(blob)) => codec::decode(&blob).unwrap_or_else(|err| {
                warn!(?err, "Stored statistics are unreadable; starting from empty");
                Snapshot::default()
            }),
            Ok(None) => Snapshot::default(),
            Err(err) => {
                warn!(?err, "Failed to load statistics; starting from empty");
                Snapshot::default()
            }
        };

        normalize_snapshot(stored, self.slot_count, total_blocks)
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StatsError> {
        let blob = codec::encode(snapshot)?;
        self.repository.store_blob(&self.storage_key, blob).await
    }
}

pub struct StatsServiceBuilder {
    repository: Arc<dyn StatsRepository>,
    settings: Arc<dyn GameSettings>,
    slot_count: usize,
    storage_key: String,
}

impl StatsServiceBuilder {
    fn new(repository: Arc<dyn StatsRepository>) -> Self {
        Self {
            repository,
            settings: Arc::new(FixedGameSettings::default()),
            slot_count: DEFAULT_SLOT_COUNT,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    pub fn with_settings(mut self, settings: Arc<dyn GameSettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_total_blocks(self, total_blocks: usize) -> Self {
        self.with_settings(Arc::new(FixedGameSettings::new(total_blocks)))
    }

    pub fn with_slot_count(mut self, slot_count: usize) -> Self {
        self.slot_count = slot_count;
        self
    }

    pub fn with_storage_key(mut self, storage_key: impl Into<String>) -> Self {
        self.storage_key = storage_key.into();
        self
    }

    pub fn build(self) -> StatsService {
        StatsService {
            repository: self.repository,
            settings: self.settings,
            slot_count: self.slot_count,
            storage_key: self.storage_key,
            write_lock: AsyncMutex::new(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{BlockResult, InMemoryStatsRepository, PlayerSummary, RoundResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const KEY: &str = "joker.statistics.v1";

    /// Accepts reads, fails every write
    #[derive(Default)]
    struct ReadOnlyRepository {
        inner: InMemoryStatsRepository,
        failed_writes: AtomicUsize,
    }

    #[async_trait]
    impl StatsRepository for ReadOnlyRepository {
        async fn load_blob(&self, key: &str) -> Result<Option<String>, StatsError> {
            self.inner.load_blob(key).await
        }

        async fn store_blob(&self, _key: &str, _blob: String) -> Result<(), StatsError> {
            self.failed_writes.fetch_add(1, Ordering::SeqCst);
            Err(StatsError::storage("disk full"))
        }

        async fn remove_blob(&self, key: &str) -> Result<(), StatsError> {
            self.inner.remove_blob(key).await
        }
    }

    struct UnreachableRepository;

    #[async_trait]
    impl StatsRepository for UnreachableRepository {
        async fn load_blob(&self, _key: &str) -> Result<Option<String>, StatsError> {
            Err(StatsError::storage("unreachable"))
        }

        async fn store_blob(&self, _key: &str, _blob: String) -> Result<(), StatsError> {
            Err(StatsError::storage("unreachable"))
        }

        async fn remove_blob(&self, _key: &str) -> Result<(), StatsError> {
            Err(StatsError::storage("unreachable"))
        }
    }

    fn three_player_game() -> CompletedGame {
        CompletedGame {
            player_count: 3,
            player_summaries: vec![
                PlayerSummary {
                    player_index: 0,
                    place: 2,
                    total_score: 1500,
                },
                PlayerSummary {
                    player_index: 1,
                    place: 1,
                    total_score: 2300,
                },
                PlayerSummary {
                    player_index: 2,
                    place: 3,
                    total_score: -200,
                },
            ],
            completed_blocks: vec![BlockResult {
                premium_players: [1].into(),
                player_rounds: vec![vec![], vec![RoundResult { is_blind: true }]],
                ..BlockResult::default()
            }],
        }
    }

    #[tokio::test]
    async fn load_snapshot_on_empty_store_is_normalized() {
        let service = StatsService::builder(Arc::new(InMemoryStatsRepository::new()))
            .with_total_blocks(3)
            .build();

        let snapshot = service.load_snapshot().await;

        for scope in Scope::ALL {
            let records = snapshot.records(scope);
            assert_eq!(records.len(), 4);
            assert!(records.iter().all(|r| r.is_empty() && r.premiums_by_block.len() == 3));
        }
    }

    #[tokio::test]
    async fn corrupt_blob_falls_back_to_empty_snapshot() {
        let repo = Arc::new(InMemoryStatsRepository::with_blob(KEY, "{ definitely not json"));
        let service = StatsService::builder(repo).build();

        let snapshot = service.load_snapshot().await;

        assert_eq!(snapshot.all_games.len(), 4);
        assert!(snapshot.all_games.iter().all(ScopedRecord::is_empty));
    }

    #[tokio::test]
    async fn storage_failure_never_reaches_the_caller() {
        let service = StatsService::builder(Arc::new(UnreachableRepository)).build();

        let snapshot = service.load_snapshot().await;
        assert_eq!(snapshot.four_players.len(), 4);

        let outcome = service.record_completed_game(&three_player_game()).await;
        assert_eq!(outcome, RecordOutcome::NotPersisted);
    }

    #[tokio::test]
    async fn persist_failure_leaves_previous_state() {
        let repo = Arc::new(ReadOnlyRepository::default());
        let service = StatsService::builder(repo.clone()).build();

        let outcome = service.record_completed_game(&three_player_game()).await;

        assert_eq!(outcome, RecordOutcome::NotPersisted);
        assert_eq!(repo.failed_writes.load(Ordering::SeqCst), 1);
        assert!(repo.inner.load_blob(KEY).await.unwrap().is_none());
        assert!(service.load_snapshot().await.all_games[1].is_empty());
    }

    #[tokio::test]
    async fn skips_games_without_players() {
        let repo = Arc::new(InMemoryStatsRepository::with_blob(KEY, "{\"legacy\":1}"));
        let service = StatsService::builder(repo.clone()).build();

        let no_players = CompletedGame {
            player_count: 0,
            ..three_player_game()
        };
        let negative_players = CompletedGame {
            player_count: -3,
            ..three_player_game()
        };
        let no_summaries = CompletedGame {
            player_summaries: vec![],
            ..three_player_game()
        };

        assert_eq!(service.record_completed_game(&no_players).await, RecordOutcome::Skipped);
        assert_eq!(
            service.record_completed_game(&negative_players).await,
            RecordOutcome::Skipped
        );
        assert_eq!(service.record_completed_game(&no_summaries).await, RecordOutcome::Skipped);
        assert_eq!(
            repo.load_blob(KEY).await.unwrap().as_deref(),
            Some("{\"legacy\":1}")
        );
    }

    #[tokio::test]
    async fn records_three_player_game_in_matching_scopes_only() {
        let service = StatsService::builder(Arc::new(InMemoryStatsRepository::new()))
            .with_total_blocks(2)
            .build();

        let outcome = service.record_completed_game(&three_player_game()).await;
        assert_eq!(
            outcome,
            RecordOutcome::Recorded {
                scopes: vec![Scope::AllGames, Scope::ThreePlayers]
            }
        );

        let snapshot = service.load_snapshot().await;
        for scope in [Scope::AllGames, Scope::ThreePlayers] {
            let winner = snapshot.record(scope, 1).unwrap();
            assert_eq!(winner.games_played, 1);
            assert_eq!(winner.first_place_count, 1);
            assert_eq!(winner.premiums_by_block, vec![1, 0]);
            assert_eq!(winner.blind_bid_count, 1);
            assert_eq!(winner.max_total_score, Some(23.0));
        }
        assert!(snapshot.four_players.iter().all(ScopedRecord::is_empty));
        assert!(snapshot.all_games[3].is_empty());
        assert_eq!(snapshot.all_games[2].min_total_score, Some(-2.0));
    }

    #[tokio::test]
    async fn two_player_game_updates_all_games_only() {
        let service = StatsService::builder(Arc::new(InMemoryStatsRepository::new())).build();
        let game = CompletedGame {
            player_count: 2,
            player_summaries: vec![PlayerSummary {
                player_index: 0,
                place: 1,
                total_score: 100,
            }],
            completed_blocks: vec![],
        };

        let outcome = service.record_completed_game(&game).await;

        assert_eq!(
            outcome,
            RecordOutcome::Recorded {
                scopes: vec![Scope::AllGames]
            }
        );
        let snapshot = service.load_snapshot().await;
        assert_eq!(snapshot.all_games[0].games_played, 1);
        assert!(snapshot.three_players.iter().all(ScopedRecord::is_empty));
        assert!(snapshot.four_players.iter().all(ScopedRecord::is_empty));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_recordings_are_not_lost() {
        let service = Arc::new(
            StatsService::builder(Arc::new(InMemoryStatsRepository::new())).build(),
        );

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service.record_completed_game(&three_player_game()).await
                })
            })
            .collect();
        for handle in handles {
            assert!(matches!(
                handle.await.unwrap(),
                RecordOutcome::Recorded { .. }
            ));
        }

        let snapshot = service.load_snapshot().await;
        assert_eq!(snapshot.all_games[0].games_played, 16);
        assert_eq!(snapshot.three_players[2].third_place_count, 16);
    }

    #[tokio::test]
    async fn player_record_and_reset() {
        let service = StatsService::builder(Arc::new(InMemoryStatsRepository::new())).build();
        service.record_completed_game(&three_player_game()).await;

        assert_eq!(
            service
                .player_record(Scope::ThreePlayers, 0)
                .await
                .unwrap()
                .second_place_count,
            1
        );
        assert!(service.player_record(Scope::AllGames, 4).await.is_none());
        assert_eq!(service.scope_records(Scope::FourPlayers).await.len(), 4);

        service.reset_statistics().await.unwrap();
        assert!(service
            .scope_records(Scope::AllGames)
            .await
            .iter()
            .all(ScopedRecord::is_empty));
    }
}
