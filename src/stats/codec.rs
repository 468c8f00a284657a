//! Persisted v1 schema of the statistics snapshot.
//!
//! Every field is optional on decode so that blobs written by older or newer
//! builds still load; counters that decode negative are clamped to zero and
//! records with a negative player index are discarded.

use serde::{Deserialize, Serialize};

use super::{ScopedRecord, Snapshot, StatsError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSnapshot {
    pub all_games_records: Vec<StoredRecord>,
    pub four_players_records: Vec<StoredRecord>,
    pub three_players_records: Vec<StoredRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredRecord {
    pub player_index: Option<i64>,
    pub games_played: Option<i64>,
    pub first_place_count: Option<i64>,
    pub second_place_count: Option<i64>,
    pub third_place_count: Option<i64>,
    pub fourth_place_count: Option<i64>,
    pub premiums_by_block: Option<Vec<Option<i64>>>,
    pub blind_bid_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_total_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_total_score: Option<f64>,
}

fn counter(value: Option<i64>) -> u32 {
    value.unwrap_or_default().clamp(0, i64::from(u32::MAX)) as u32
}

impl StoredRecord {
    fn into_record(self) -> Option<ScopedRecord> {
        let player_index = usize::try_from(self.player_index.unwrap_or_default()).ok()?;

        Some(ScopedRecord {
            player_index,
            games_played: counter(self.games_played),
            first_place_count: counter(self.first_place_count),
            second_place_count: counter(self.second_place_count),
            third_place_count: counter(self.third_place_count),
            fourth_place_count: counter(self.fourth_place_count),
            premiums_by_block: self
                .premiums_by_block
                .unwrap_or_default()
                .into_iter()
                .map(counter)
                .collect(),
            blind_bid_count: counter(self.blind_bid_count),
            max_total_score: self.max_total_score,
            min_total_score: self.min_total_score,
        })
    }
}

impl From<&ScopedRecord> for StoredRecord {
    fn from(record: &ScopedRecord) -> Self {
        Self {
            player_index: Some(record.player_index as i64),
            games_played: Some(record.games_played.into()),
            first_place_count: Some(record.first_place_count.into()),
            second_place_count: Some(record.second_place_count.into()),
            third_place_count: Some(record.third_place_count.into()),
            fourth_place_count: Some(record.fourth_place_count.into()),
            premiums_by_block: Some(
                record
                    .premiums_by_block
                    .iter()
                    .map(|count| Some(i64::from(*count)))
                    .collect(),
            ),
            blind_bid_count: Some(record.blind_bid_count.into()),
            max_total_score: record.max_total_score,
            min_total_score: record.min_total_score,
        }
    }
}

fn into_records(stored: Vec<StoredRecord>) -> Vec<ScopedRecord> {
    stored.into_iter().filter_map(StoredRecord::into_record).collect()
}

fn from_records(records: &[ScopedRecord]) -> Vec<StoredRecord> {
    records.iter().map(StoredRecord::from).collect()
}

impl From<StoredSnapshot> for Snapshot {
    fn from(stored: StoredSnapshot) -> Self {
        Snapshot {
            all_games: into_records(stored.all_games_records),
            three_players: into_records(stored.three_players_records),
            four_players: into_records(stored.four_players_records),
        }
    }
}

impl From<&Snapshot> for StoredSnapshot {
    fn from(snapshot: &Snapshot) -> Self {
        StoredSnapshot {
            all_games_records: from_records(&snapshot.all_games),
            four_players_records: from_records(&snapshot.four_players),
            three_players_records: from_records(&snapshot.three_players),
        }
    }
}

pub fn encode(snapshot: &Snapshot) -> Result<String, StatsError> {
    Ok(serde_json::to_string(&StoredSnapshot::from(snapshot))?)
}

/// Decodes a blob without normalizing it.
pub fn decode(blob: &str) -> Result<Snapshot, StatsError> {
    let stored: StoredSnapshot = serde_json::from_str(blob)?;
    Ok(stored.into())
}
