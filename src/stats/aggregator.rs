use std::collections::BTreeMap;

use super::{
    extractor::DeltaFactsByPlayer,
    normalize::{normalize_record, normalize_score},
    PlayerDeltaFacts, ScopedRecord,
};

/// Folds one game's delta facts into a scope's record collection.
pub struct ScopeAggregator {
    slot_count: usize,
    total_blocks: usize,
}

impl ScopeAggregator {
    pub fn new(slot_count: usize, total_blocks: usize) -> Self {
        Self {
            slot_count,
            total_blocks,
        }
    }

    /// Updates every present player within `[0, player_count)`; absent players are untouched.
    pub fn apply(
        &self,
        records: Vec<ScopedRecord>,
        deltas: &DeltaFactsByPlayer,
        player_count: usize,
    ) -> Vec<ScopedRecord> {
        let mut by_index: BTreeMap<usize, ScopedRecord> = records
            .into_iter()
            .map(|record| (record.player_index, record))
            .collect();

        for player_index in 0..self.slot_count {
            by_index
                .entry(player_index)
                .or_insert_with(|| ScopedRecord::empty(player_index, self.total_blocks));
        }

        for (player_index, facts) in deltas.range(..player_count) {
            if let Some(record) = by_index.get_mut(player_index) {
                self.accumulate(record, facts, player_count);
            }
        }

        by_index.into_values().collect()
    }

    fn accumulate(&self, record: &mut ScopedRecord, facts: &PlayerDeltaFacts, player_count: usize) {
        if record.premiums_by_block.len() != self.total_blocks {
            *record = normalize_record(std::mem::take(record), self.total_blocks);
        }

        record.games_played = record.games_played.saturating_add(1);

        let place_counter = match facts.place {
            1 => Some(&mut record.first_place_count),
            2 => Some(&mut record.second_place_count),
            3 => Some(&mut record.third_place_count),
            4 if player_count >= 4 => Some(&mut record.fourth_place_count),
            _ => None,
        };
        if let Some(counter) = place_counter {
            *counter = counter.saturating_add(1);
        }

        for (counter, flag) in record
            .premiums_by_block
            .iter_mut()
            .zip(facts.premiums_by_block.iter())
        {
            *counter = counter.saturating_add(*flag);
        }

        record.blind_bid_count = record.blind_bid_count.saturating_add(facts.blind_bid_count);

        let score = normalize_score(facts.total_score_normalized);
        record.max_total_score = Some(record.max_total_score.map_or(score, |max| max.max(score)));
        record.min_total_score = Some(record.min_total_score.map_or(score, |min| min.min(score)));
    }
}
