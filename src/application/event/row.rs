//! Version-independent player rows and the cell conversions shared by every schema.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::application::loose::{Loose, text_of};
use crate::domain::event::{
    NOT_PLAYED, PlayerScore, Position, RoundScoreOrStatus, Thru, format_net_score,
};

use super::details::round_detail;

/// Header fields a payload may carry about its own tournament.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawHeader {
    #[serde(alias = "tournamentName")]
    pub name: Option<String>,
    #[serde(alias = "startDate")]
    pub start: Option<Loose>,
    #[serde(alias = "endDate")]
    pub end: Option<Loose>,
    #[serde(alias = "courseName")]
    pub course: Option<String>,
}

/// One hole of a scorecard.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawHole {
    #[serde(alias = "holeNumber")]
    pub hole: Option<Loose>,
    pub par: Option<Loose>,
    pub score: Option<Loose>,
}

/// A leaderboard row after schema-specific extraction.
#[derive(Debug, Default)]
pub(super) struct PlayerRow {
    pub name: String,
    pub pos: Option<Loose>,
    pub rounds: [Option<Loose>; 4],
    pub strokes: Option<Loose>,
    pub thru: Option<Loose>,
    pub today: Option<Loose>,
    pub total: Option<Loose>,
    /// Scorecards keyed by round number.
    pub holes: BTreeMap<u8, Vec<RawHole>>,
}

/// Schema-independent result of parsing one payload.
#[derive(Debug, Default)]
pub(super) struct ParsedLeaderboard {
    pub header: RawHeader,
    pub rows: Vec<PlayerRow>,
}

impl PlayerRow {
    pub(super) fn into_score(self, include_details: bool) -> PlayerScore {
        let [round_1, round_2, round_3, round_4] = self.rounds.map(|cell| round_cell(cell.as_ref()));
        let round_details = include_details.then(|| {
            self.holes
                .into_iter()
                .filter_map(|(round, holes)| round_detail(holes).map(|detail| (round, detail)))
                .collect()
        });

        PlayerScore {
            round_1,
            round_2,
            round_3,
            round_4,
            name: self.name,
            strokes: self
                .strokes
                .as_ref()
                .and_then(Loose::int)
                .and_then(|strokes| u32::try_from(strokes).ok())
                .filter(|strokes| *strokes > 0),
            pos: position_cell(self.pos.as_ref()),
            thru: thru_cell(self.thru.as_ref()),
            today: net_cell(self.today.as_ref()),
            total: net_cell(self.total.as_ref()),
            round_details,
        }
    }
}

/// Round number of a 1-based round cell, if it is one of the four scored rounds.
pub(super) fn round_number(cell: Option<&Loose>) -> Option<u8> {
    cell.and_then(Loose::int)
        .and_then(|round| u8::try_from(round).ok())
        .filter(|round| (1..=4).contains(round))
}

pub(super) fn round_cell(cell: Option<&Loose>) -> RoundScoreOrStatus {
    match cell {
        None | Some(Loose::Flag(_)) => RoundScoreOrStatus::NotPlayed,
        Some(Loose::Int(value)) => RoundScoreOrStatus::from_number(*value),
        Some(Loose::Text(value)) => RoundScoreOrStatus::from_text(value),
        Some(float @ Loose::Float(_)) => float
            .int()
            .map_or(RoundScoreOrStatus::NotPlayed, RoundScoreOrStatus::from_number),
    }
}

fn position_cell(cell: Option<&Loose>) -> Position {
    match text_of(cell) {
        Some(value) => Position::parse(&value),
        None => Position::Place(NOT_PLAYED.to_string()),
    }
}

fn thru_cell(cell: Option<&Loose>) -> Thru {
    match cell {
        Some(Loose::Int(value)) => Thru::from_number(*value),
        Some(other) => Thru::parse(&other.text()),
        None => Thru::Other(NOT_PLAYED.to_string()),
    }
}

/// Relative-to-par cell: whole numbers (including numeric text) are formatted, other text
/// passes through.
fn net_cell(cell: Option<&Loose>) -> String {
    match cell.and_then(Loose::int) {
        Some(value) => format_net_score(value),
        None => text_of(cell).unwrap_or_else(|| NOT_PLAYED.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::StatusToken;

    #[test]
    fn round_cells_accept_numbers_and_text() {
        assert_eq!(round_cell(Some(&Loose::Int(71))), RoundScoreOrStatus::Numeric(71));
        assert_eq!(round_cell(Some(&Loose::Int(0))), RoundScoreOrStatus::NotPlayed);
        assert_eq!(round_cell(Some(&Loose::Float(69.0))), RoundScoreOrStatus::Numeric(69));
        assert_eq!(round_cell(None), RoundScoreOrStatus::NotPlayed);
        assert_eq!(
            round_cell(Some(&Loose::Text("DQ".into()))),
            RoundScoreOrStatus::Status(StatusToken::Dq)
        );
    }

    #[test]
    fn net_cells_format_numbers_only() {
        assert_eq!(net_cell(Some(&Loose::Int(-4))), "-4");
        assert_eq!(net_cell(Some(&Loose::Int(0))), "E");
        assert_eq!(net_cell(Some(&Loose::Int(3))), "+3");
        assert_eq!(net_cell(Some(&Loose::Text("E".into()))), "E");
        assert_eq!(net_cell(Some(&Loose::Text("".into()))), "-");
        assert_eq!(net_cell(None), "-");
    }

    #[test]
    fn numeric_text_net_cells_are_formatted_like_numbers() {
        assert_eq!(net_cell(Some(&Loose::Text("0".into()))), "E");
        assert_eq!(net_cell(Some(&Loose::Text("+0".into()))), "E");
        assert_eq!(net_cell(Some(&Loose::Text("-3".into()))), "-3");
        assert_eq!(net_cell(Some(&Loose::Text("2".into()))), "+2");
        assert_eq!(net_cell(Some(&Loose::Float(-1.5))), "-1.5");
    }

    #[test]
    fn thru_cells() {
        assert_eq!(thru_cell(Some(&Loose::Int(12))), Thru::Holes(12));
        assert_eq!(thru_cell(Some(&Loose::Text("F*".into()))), Thru::Holes(18));
        assert_eq!(thru_cell(None), Thru::Other("-".into()));
    }

    #[test]
    fn round_numbers_are_bounded() {
        assert_eq!(round_number(Some(&Loose::Int(3))), Some(3));
        assert_eq!(round_number(Some(&Loose::Text("2".into()))), Some(2));
        assert_eq!(round_number(Some(&Loose::Int(5))), None);
        assert_eq!(round_number(Some(&Loose::Int(0))), None);
    }
}
