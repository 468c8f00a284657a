use std::sync::Arc;

use joker_stats::stats::{InMemoryStatsRepository, StatsRepository, StatsService};

pub const STORAGE_KEY: &str = "joker.statistics.v1";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub stats_repository: Arc<InMemoryStatsRepository>,
    pub stats_service: Arc<StatsService>,
}

impl TestSetup {
    /// Raw blob currently persisted, if any
    pub async fn stored_blob(&self) -> Option<String> {
        self.stats_repository
            .load_blob(STORAGE_KEY)
            .await
            .expect("in-memory load never fails")
    }
}

pub struct TestSetupBuilder {
    total_blocks: usize,
    slot_count: usize,
    initial_blob: Option<String>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            total_blocks: 4,
            slot_count: 4,
            initial_blob: None,
        }
    }

    pub fn with_total_blocks(mut self, total_blocks: usize) -> Self {
        self.total_blocks = total_blocks;
        self
    }

    pub fn with_slot_count(mut self, slot_count: usize) -> Self {
        self.slot_count = slot_count;
        self
    }

    pub fn with_stored_blob(mut self, blob: impl Into<String>) -> Self {
        self.initial_blob = Some(blob.into());
        self
    }

    pub fn build(self) -> TestSetup {
        let stats_repository = Arc::new(match self.initial_blob {
            Some(blob) => InMemoryStatsRepository::with_blob(STORAGE_KEY, blob),
            None => InMemoryStatsRepository::new(),
        });

        let stats_service = StatsService::builder(stats_repository.clone())
            .with_total_blocks(self.total_blocks)
            .with_slot_count(self.slot_count)
            .with_storage_key(STORAGE_KEY)
            .build();

        TestSetup {
            stats_repository,
            stats_service: Arc::new(stats_service),
        }
    }
}
