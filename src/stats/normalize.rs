use std::collections::BTreeMap;

use super::{Scope, ScopedRecord, Snapshot};

/// Above this magnitude `value * 10.0` no longer rounds back to the same tenth.
pub const MAX_ROUNDED_SCORE: f64 = 1.0e14;

/// Converts a raw integer score (hundredths) into displayed points with one decimal.
///
/// Halves round away from zero: 1255 -> 12.6, -1255 -> -12.6.
pub fn normalize_raw_score(raw: i64) -> f64 {
    let (quotient, remainder) = (raw / 10, raw % 10);
    let tenths = match remainder {
        5.. => quotient + 1,
        ..=-5 => quotient - 1,
        _ => quotient,
    };
    tenths as f64 / 10.0
}

/// Rounds an already-scaled score to one decimal place, halves away from zero.
///
/// Fixed point for every value produced by [`normalize_raw_score`]. Values at or
/// beyond [`MAX_ROUNDED_SCORE`] in magnitude, and non-finite values, pass through
/// unchanged: tenths are not representable there.
pub fn normalize_score(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= MAX_ROUNDED_SCORE {
        return value;
    }
    (value * 10.0).round() / 10.0
}

/// Pads or truncates the premium sequence and repairs the score bounds.
pub fn normalize_record(mut record: ScopedRecord, total_blocks: usize) -> ScopedRecord {
    record.premiums_by_block.resize(total_blocks, 0);

    let max = record
        .max_total_score
        .map(normalize_score)
        .filter(|score| score.is_finite());
    let min = record
        .min_total_score
        .map(normalize_score)
        .filter(|score| score.is_finite());

    let (max, min) = match (max, min) {
        (Some(max), Some(min)) if max < min => (Some(min), Some(max)),
        (Some(max), None) => (Some(max), Some(max)),
        (None, Some(min)) => (Some(min), Some(min)),
        bounds => bounds,
    };
    record.max_total_score = max;
    record.min_total_score = min;
    record
}

/// Produces exactly `slot_count` records ordered by player index.
///
/// Later duplicates win; records outside `[0, slot_count)` are dropped.
pub fn normalize_records(
    records: Vec<ScopedRecord>,
    slot_count: usize,
    total_blocks: usize,
) -> Vec<ScopedRecord> {
    let mut by_index: BTreeMap<usize, ScopedRecord> = records
        .into_iter()
        .filter(|record| record.player_index < slot_count)
        .map(|record| (record.player_index, normalize_record(record, total_blocks)))
        .collect();

    for player_index in 0..slot_count {
        by_index
            .entry(player_index)
            .or_insert_with(|| ScopedRecord::empty(player_index, total_blocks));
    }

    by_index.into_values().collect()
}

pub fn normalize_snapshot(
    mut snapshot: Snapshot,
    slot_count: usize,
    total_blocks: usize,
) -> Snapshot {
    for scope in Scope::ALL {
        let records = std::mem::take(snapshot.records_mut(scope));
        *snapshot.records_mut(scope) = normalize_records(records, slot_count, total_blocks);
    }
    snapshot
}
