// Library crate for the Joker statistics service
// This file exposes the public API for integration tests

pub mod config;
pub mod shared;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use config::{FixedGameSettings, GameSettings, StatsConfig};
pub use shared::{AppError, AppState};
pub use stats::{
    CompletedGame, RecordOutcome, Scope, ScopedRecord, Snapshot, StatsError, StatsRepository,
    StatsService,
};
