//! Scraped page leaderboards.
//!
//! The page embeds a `leaderboard.competitors` list that mixes player rows with section
//! headers and ads; only rows typed `athlete` are players. Round scores live in `linescores`,
//! one per period, each optionally carrying its holes.

use serde::Deserialize;
use serde_json::Value;

use crate::application::loose::Loose;

use super::row::{ParsedLeaderboard, PlayerRow, RawHeader, RawHole, round_number};

const PLAYER_ROW_TYPE: &str = "athlete";

#[derive(Debug, Deserialize)]
struct Page {
    leaderboard: Board,
}

#[derive(Debug, Deserialize)]
struct Board {
    competitors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Competitor {
    athlete: Athlete,
    #[serde(default)]
    status: CompetitorStatus,
    score: Option<Loose>,
    strokes: Option<Loose>,
    #[serde(default)]
    linescores: Vec<Linescore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Athlete {
    display_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct CompetitorStatus {
    position: Option<Loose>,
    thru: Option<Loose>,
    today: Option<Loose>,
}

#[derive(Debug, Deserialize)]
struct Linescore {
    period: Option<Loose>,
    value: Option<Loose>,
    #[serde(default)]
    holes: Vec<RawHole>,
}

pub(super) fn parse(raw: &Value) -> Result<ParsedLeaderboard, serde_json::Error> {
    let page = Page::deserialize(raw)?;
    let header = raw
        .get("leaderboard")
        .map(RawHeader::deserialize)
        .transpose()?
        .unwrap_or_default();

    let mut rows = Vec::new();
    for competitor in page.leaderboard.competitors {
        if competitor.get("type").and_then(Value::as_str) != Some(PLAYER_ROW_TYPE) {
            continue;
        }
        let competitor = Competitor::deserialize(competitor)?;
        rows.push(player_row(competitor));
    }

    Ok(ParsedLeaderboard { header, rows })
}

fn player_row(competitor: Competitor) -> PlayerRow {
    let mut row = PlayerRow {
        name: competitor.athlete.display_name,
        pos: competitor.status.position,
        strokes: competitor.strokes,
        thru: competitor.status.thru,
        today: competitor.status.today,
        total: competitor.score,
        ..PlayerRow::default()
    };

    for linescore in competitor.linescores {
        let Some(round) = round_number(linescore.period.as_ref()) else {
            continue;
        };
        row.rounds[usize::from(round - 1)] = linescore.value;
        if !linescore.holes.is_empty() {
            row.holes.insert(round, linescore.holes);
        }
    }
    row
}
