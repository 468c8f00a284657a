pub mod aggregator;
pub mod codec;
pub mod extractor;
pub mod handlers;
pub mod normalize;
pub mod repository;
pub mod service;

mod errors;
pub mod models;

pub use aggregator::ScopeAggregator;
pub use errors::StatsError;
pub use extractor::{DeltaFactsByPlayer, GameOutcomeExtractor};
pub use models::*;
pub use repository::{
    FileStatsRepository, InMemoryStatsRepository, PostgresStatsRepository, StatsRepository,
};
pub use service::{RecordOutcome, StatsService, StatsServiceBuilder};
