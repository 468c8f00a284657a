use std::str::FromStr;

pub const DEFAULT_TOTAL_BLOCKS: usize = 4;
pub const DEFAULT_SLOT_COUNT: usize = 4;
pub const DEFAULT_STORAGE_KEY: &str = "joker.statistics.v1";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Source of the game rules settings the statistics depend on.
///
/// Kept separate from [`StatsConfig`] so the block count can follow whatever
/// the game settings currently say.
pub trait GameSettings: Send + Sync {
    /// Number of scoring blocks in one game
    fn total_blocks(&self) -> usize;
}

/// Settings that never change at runtime
#[derive(Debug, Clone, Copy)]
pub struct FixedGameSettings {
    total_blocks: usize,
}

impl FixedGameSettings {
    pub fn new(total_blocks: usize) -> Self {
        Self { total_blocks }
    }
}

impl Default for FixedGameSettings {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_BLOCKS)
    }
}

impl GameSettings for FixedGameSettings {
    fn total_blocks(&self) -> usize {
        self.total_blocks
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            "postgres" => Ok(StorageBackend::Postgres),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatsConfig {
    pub total_blocks: usize,
    pub slot_count: usize,
    pub storage_key: String,
    pub backend: StorageBackend,
    pub data_dir: String,
    pub database_url: Option<String>,
    pub bind_addr: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            total_blocks: DEFAULT_TOTAL_BLOCKS,
            slot_count: DEFAULT_SLOT_COUNT,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            backend: StorageBackend::Memory,
            data_dir: DEFAULT_DATA_DIR.to_string(),
            database_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl StatsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup; unparseable values keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let positive = |name: &str, default: usize| {
            lookup(name)
                .and_then(|value| value.trim().parse::<usize>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(default)
        };

        Self {
            total_blocks: positive("STATS_TOTAL_BLOCKS", defaults.total_blocks),
            slot_count: positive("STATS_SLOT_COUNT", defaults.slot_count),
            storage_key: lookup("STATS_STORAGE_KEY")
                .filter(|key| !key.trim().is_empty())
                .unwrap_or(defaults.storage_key),
            backend: lookup("STATS_BACKEND")
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.backend),
            data_dir: lookup("STATS_DATA_DIR").unwrap_or(defaults.data_dir),
            database_url: lookup("DATABASE_URL"),
            bind_addr: lookup("STATS_BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }

    pub fn game_settings(&self) -> FixedGameSettings {
        FixedGameSettings::new(self.total_blocks)
    }
}
