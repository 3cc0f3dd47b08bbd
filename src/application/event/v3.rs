//! GraphQL leaderboards.

use serde::Deserialize;
use serde_json::Value;

use crate::application::loose::Loose;

use super::row::{ParsedLeaderboard, PlayerRow, RawHeader, RawHole, round_number};

/// Player rows are `PlayerRowV2`, `PlayerRowV3`, ...; information rows use other typenames.
const PLAYER_ROW_PREFIX: &str = "PlayerRow";

#[derive(Debug, Deserialize)]
struct Response {
    data: Data,
}

#[derive(Debug, Deserialize)]
struct Data {
    leaderboard: Leaderboard,
}

#[derive(Debug, Deserialize)]
struct Leaderboard {
    players: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerEntry {
    player: Player,
    scoring_data: ScoringData,
    scorecard: Option<Scorecard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Player {
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoringData {
    position: Option<Loose>,
    total: Option<Loose>,
    thru: Option<Loose>,
    score: Option<Loose>,
    total_strokes: Option<Loose>,
    #[serde(default)]
    rounds: Vec<Option<Loose>>,
}

#[derive(Debug, Deserialize)]
struct Scorecard {
    #[serde(default)]
    rounds: Vec<ScorecardRound>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScorecardRound {
    round_number: Option<Loose>,
    #[serde(default)]
    holes: Vec<RawHole>,
}

pub(super) fn parse(raw: &Value) -> Result<ParsedLeaderboard, serde_json::Error> {
    let response = Response::deserialize(raw)?;
    let header = raw
        .get("data")
        .and_then(|data| data.get("leaderboard"))
        .map(RawHeader::deserialize)
        .transpose()?
        .unwrap_or_default();

    let mut rows = Vec::new();
    for entry in response.data.leaderboard.players {
        let is_player = entry
            .get("__typename")
            .and_then(Value::as_str)
            .is_some_and(|typename| typename.starts_with(PLAYER_ROW_PREFIX));
        if !is_player {
            continue;
        }
        rows.push(player_row(PlayerEntry::deserialize(entry)?));
    }

    Ok(ParsedLeaderboard { header, rows })
}

fn player_row(entry: PlayerEntry) -> PlayerRow {
    let scoring = entry.scoring_data;
    let mut row = PlayerRow {
        name: entry.player.display_name,
        pos: scoring.position,
        strokes: scoring.total_strokes,
        thru: scoring.thru,
        today: scoring.score,
        total: scoring.total,
        ..PlayerRow::default()
    };

    for (slot, cell) in row.rounds.iter_mut().zip(scoring.rounds) {
        *slot = cell;
    }

    for round in entry.scorecard.map(|card| card.rounds).unwrap_or_default() {
        let Some(number) = round_number(round.round_number.as_ref()) else {
            continue;
        };
        if !round.holes.is_empty() {
            row.holes.insert(number, round.holes);
        }
    }
    row
}
