//! Historical snapshots: a flat list of score rows keyed like the canonical record.

use serde::Deserialize;
use serde_json::Value;

use crate::application::loose::Loose;

use super::row::{ParsedLeaderboard, PlayerRow, RawHeader};

#[derive(Debug, Deserialize)]
struct Snapshot {
    scores: Vec<SnapshotRow>,
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    name: Option<String>,
    pos: Option<Loose>,
    #[serde(rename = "1")]
    round_1: Option<Loose>,
    #[serde(rename = "2")]
    round_2: Option<Loose>,
    #[serde(rename = "3")]
    round_3: Option<Loose>,
    #[serde(rename = "4")]
    round_4: Option<Loose>,
    strokes: Option<Loose>,
    thru: Option<Loose>,
    today: Option<Loose>,
    total: Option<Loose>,
}

pub(super) fn parse(raw: &Value) -> Result<ParsedLeaderboard, serde_json::Error> {
    let header = RawHeader::deserialize(raw)?;
    let snapshot = Snapshot::deserialize(raw)?;

    let rows = snapshot
        .scores
        .into_iter()
        .filter_map(|row| {
            let name = row.name.filter(|name| !name.trim().is_empty())?;
            Some(PlayerRow {
                name,
                pos: row.pos,
                rounds: [row.round_1, row.round_2, row.round_3, row.round_4],
                strokes: row.strokes,
                thru: row.thru,
                today: row.today,
                total: row.total,
                ..PlayerRow::default()
            })
        })
        .collect();

    Ok(ParsedLeaderboard { header, rows })
}
