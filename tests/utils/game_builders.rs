use joker_stats::stats::{BlockResult, CompletedGame, PlayerSummary, RoundResult};

// ============================================================================
// Completed Game Utilities
// ============================================================================

pub struct GameBuilder {
    player_count: usize,
    summaries: Vec<PlayerSummary>,
    blocks: Vec<BlockResult>,
}

impl GameBuilder {
    pub fn new(player_count: usize) -> Self {
        Self {
            player_count,
            summaries: vec![],
            blocks: vec![],
        }
    }

    pub fn with_player(mut self, player_index: usize, place: u32, total_score: i64) -> Self {
        self.summaries.push(PlayerSummary {
            player_index,
            place,
            total_score,
        });
        self
    }

    /// Seats every player of the game, finishing in seat order with zero score
    pub fn with_all_players(mut self) -> Self {
        for seat in 0..self.player_count {
            self = self.with_player(seat, seat as u32 + 1, 0);
        }
        self
    }

    /// Appends a block awarding premiums to `premium` and zero-premiums to `zero_premium`
    pub fn with_block(mut self, premium: &[usize], zero_premium: &[usize]) -> Self {
        self.blocks.push(BlockResult {
            premium_players: premium.iter().copied().collect(),
            zero_premium_players: zero_premium.iter().copied().collect(),
            player_rounds: vec![vec![]; self.player_count],
        });
        self
    }

    /// Adds one round to the last block for `player_index`, creating a block if none exists
    pub fn with_round(mut self, player_index: usize, is_blind: bool) -> Self {
        if self.blocks.is_empty() {
            self = self.with_block(&[], &[]);
        }
        if let Some(block) = self.blocks.last_mut() {
            if block.player_rounds.len() <= player_index {
                block.player_rounds.resize(player_index + 1, vec![]);
            }
            block.player_rounds[player_index].push(RoundResult { is_blind });
        }
        self
    }

    pub fn build(self) -> CompletedGame {
        CompletedGame {
            player_count: self.player_count as i64,
            player_summaries: self.summaries,
            completed_blocks: self.blocks,
        }
    }
}
