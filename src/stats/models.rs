use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::StatsError;

/// One of the three independent aggregation buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "all")]
    AllGames,
    #[serde(rename = "three")]
    ThreePlayers,
    #[serde(rename = "four")]
    FourPlayers,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::AllGames, Scope::ThreePlayers, Scope::FourPlayers];

    /// The player-count specific scope, if any, for a game of `player_count` players
    pub fn for_player_count(player_count: usize) -> Option<Scope> {
        match player_count {
            3 => Some(Scope::ThreePlayers),
            4 => Some(Scope::FourPlayers),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::AllGames => "all",
            Scope::ThreePlayers => "three",
            Scope::FourPlayers => "four",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Scope::AllGames),
            "three" => Ok(Scope::ThreePlayers),
            "four" => Ok(Scope::FourPlayers),
            other => Err(StatsError::Validation(format!("unknown scope '{other}'"))),
        }
    }
}

/// Lifetime counters of one seating slot within one scope
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScopedRecord {
    pub player_index: usize,
    pub games_played: u32,
    pub first_place_count: u32,
    pub second_place_count: u32,
    pub third_place_count: u32,
    pub fourth_place_count: u32,
    pub premiums_by_block: Vec<u32>,
    pub blind_bid_count: u32,
    pub max_total_score: Option<f64>,
    pub min_total_score: Option<f64>,
}

impl ScopedRecord {
    /// Creates an all-zero record with unset score bounds
    pub fn empty(player_index: usize, total_blocks: usize) -> Self {
        Self {
            player_index,
            premiums_by_block: vec![0; total_blocks],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.games_played == 0
            && self.first_place_count == 0
            && self.second_place_count == 0
            && self.third_place_count == 0
            && self.fourth_place_count == 0
            && self.blind_bid_count == 0
            && self.premiums_by_block.iter().all(|count| *count == 0)
            && self.max_total_score.is_none()
            && self.min_total_score.is_none()
    }
}

/// The unit of persistence: one record collection per scope
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub all_games: Vec<ScopedRecord>,
    pub three_players: Vec<ScopedRecord>,
    pub four_players: Vec<ScopedRecord>,
}

impl Snapshot {
    pub fn records(&self, scope: Scope) -> &[ScopedRecord] {
        match scope {
            Scope::AllGames => &self.all_games,
            Scope::ThreePlayers => &self.three_players,
            Scope::FourPlayers => &self.four_players,
        }
    }

    pub fn records_mut(&mut self, scope: Scope) -> &mut Vec<ScopedRecord> {
        match scope {
            Scope::AllGames => &mut self.all_games,
            Scope::ThreePlayers => &mut self.three_players,
            Scope::FourPlayers => &mut self.four_players,
        }
    }

    pub fn record(&self, scope: Scope, player_index: usize) -> Option<&ScopedRecord> {
        self.records(scope)
            .iter()
            .find(|record| record.player_index == player_index)
    }
}

/// Per-player facts extracted from a single completed game. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerDeltaFacts {
    pub place: u32,
    pub total_score_normalized: f64,
    pub premiums_by_block: Vec<u32>,
    pub blind_bid_count: u32,
}

/// Final standing of one player as reported by the game engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player_index: usize,
    pub place: u32,
    /// Raw integer score, in hundredths of a displayed point
    pub total_score: i64,
}

/// One player's outcome for a single round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoundResult {
    pub is_blind: bool,
}

/// The outcome of one completed scoring block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockResult {
    pub premium_players: BTreeSet<usize>,
    pub zero_premium_players: BTreeSet<usize>,
    /// Round results indexed by player index, each in round order
    pub player_rounds: Vec<Vec<RoundResult>>,
}

impl BlockResult {
    /// Whether the player earned either kind of premium in this block
    pub fn awarded_premium(&self, player_index: usize) -> bool {
        self.premium_players.contains(&player_index)
            || self.zero_premium_players.contains(&player_index)
    }

    /// Blind bids placed by the player in this block; zero if the player has no rounds recorded
    pub fn blind_bids(&self, player_index: usize) -> u32 {
        self.player_rounds
            .get(player_index)
            .map(|rounds| rounds.iter().filter(|round| round.is_blind).count() as u32)
            .unwrap_or_default()
    }
}

/// A completed-game notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedGame {
    /// As reported by the game; zero or negative means nothing was played
    pub player_count: i64,
    pub player_summaries: Vec<PlayerSummary>,
    #[serde(default)]
    pub completed_blocks: Vec<BlockResult>,
}

impl CompletedGame {
    /// Nothing to record: no players or no summaries
    pub fn is_empty(&self) -> bool {
        self.player_count <= 0 || self.player_summaries.is_empty()
    }

    /// Number of seats at the table, 0 for a non-positive player count
    pub fn seat_count(&self) -> usize {
        usize::try_from(self.player_count).unwrap_or(0)
    }
}
