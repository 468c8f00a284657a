use std::collections::BTreeMap;

use super::{normalize::normalize_raw_score, CompletedGame, PlayerDeltaFacts};

pub type DeltaFactsByPlayer = BTreeMap<usize, PlayerDeltaFacts>;

/// Derives per-player delta facts from a completed game.
///
/// Missing history contributes zero: blocks the game never reached have no
/// premium, and players without recorded rounds in a block have no blind bids.
pub struct GameOutcomeExtractor {
    total_blocks: usize,
}

impl GameOutcomeExtractor {
    pub fn new(total_blocks: usize) -> Self {
        Self { total_blocks }
    }

    pub fn extract(&self, game: &CompletedGame) -> DeltaFactsByPlayer {
        if game.is_empty() {
            return DeltaFactsByPlayer::new();
        }

        game.player_summaries
            .iter()
            .map(|summary| {
                let player_index = summary.player_index;

                let premiums_by_block = (0..self.total_blocks)
                    .map(|block_index| {
                        game.completed_blocks
                            .get(block_index)
                            .map(|block| u32::from(block.awarded_premium(player_index)))
                            .unwrap_or_default()
                    })
                    .collect();

                let blind_bid_count = game
                    .completed_blocks
                    .iter()
                    .map(|block| block.blind_bids(player_index))
                    .sum();

                let facts = PlayerDeltaFacts {
                    place: summary.place,
                    total_score_normalized: normalize_raw_score(summary.total_score),
                    premiums_by_block,
                    blind_bid_count,
                };

                (player_index, facts)
            })
            .collect()
    }
}
