//! Canonical event record returned for every upstream leaderboard shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use time::OffsetDateTime;

/// Placeholder written for a round that has not been played.
pub const NOT_PLAYED: &str = "-";
/// Holes in a completed round.
pub const HOLES_PER_ROUND: u8 = 18;

const FINISHED_MARKERS: [&str; 3] = ["F", "FIN", "FINISHED"];

/// Non-numeric player states that replace a position and unplayed rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusToken {
    /// Missed the cut.
    Cut,
    /// Made the cut, did not finish (secondary cut).
    Mdf,
    /// Withdrew.
    Wd,
    /// Disqualified.
    Dq,
    /// Did not start.
    Dns,
}

impl StatusToken {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusToken::Cut => "CUT",
            StatusToken::Mdf => "MDF",
            StatusToken::Wd => "WD",
            StatusToken::Dq => "DQ",
            StatusToken::Dns => "DNS",
        }
    }

    /// Case-insensitive parse of an upstream status string.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CUT" | "MC" => Some(StatusToken::Cut),
            "MDF" => Some(StatusToken::Mdf),
            "WD" => Some(StatusToken::Wd),
            "DQ" => Some(StatusToken::Dq),
            "DNS" => Some(StatusToken::Dns),
            _ => None,
        }
    }
}

impl fmt::Display for StatusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score of one round, or why there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundScoreOrStatus {
    Numeric(i32),
    Status(StatusToken),
    /// Round not started yet; upstream shows the tee time instead of a score.
    TeeTime(String),
    NotPlayed,
}

impl RoundScoreOrStatus {
    /// Interpret an upstream text cell.
    pub fn from_text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().all(|ch| ch == '-') {
            return Self::NotPlayed;
        }
        if let Some(token) = StatusToken::parse(trimmed) {
            return Self::Status(token);
        }
        match trimmed.parse::<i64>() {
            Ok(number) => Self::from_number(number),
            Err(_) => Self::TeeTime(trimmed.to_string()),
        }
    }

    /// Interpret an upstream numeric cell; zero and negatives mean "not played".
    pub fn from_number(value: i64) -> Self {
        match i32::try_from(value) {
            Ok(strokes) if strokes > 0 => Self::Numeric(strokes),
            _ => Self::NotPlayed,
        }
    }

    /// True only for a real stroke count.
    pub fn is_scored(&self) -> bool {
        matches!(self, Self::Numeric(strokes) if *strokes > 0)
    }
}

impl Serialize for RoundScoreOrStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Numeric(strokes) => serializer.serialize_i32(*strokes),
            Self::Status(token) => serializer.serialize_str(token.as_str()),
            Self::TeeTime(value) => serializer.serialize_str(value),
            Self::NotPlayed => serializer.serialize_str(NOT_PLAYED),
        }
    }
}

/// Leaderboard position: an upstream place string (`"1"`, `"T3"`) or a status token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Place(String),
    Status(StatusToken),
}

impl Position {
    pub fn parse(value: &str) -> Self {
        match StatusToken::parse(value) {
            Some(token) => Self::Status(token),
            None => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    Self::Place(NOT_PLAYED.to_string())
                } else {
                    Self::Place(trimmed.to_string())
                }
            }
        }
    }

    pub fn status(&self) -> Option<StatusToken> {
        match self {
            Self::Status(token) => Some(*token),
            Self::Place(_) => None,
        }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Place(place) => serializer.serialize_str(place),
            Self::Status(token) => serializer.serialize_str(token.as_str()),
        }
    }
}

/// Holes completed in the current round, or a passthrough value such as a tee time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thru {
    Holes(u8),
    Other(String),
}

impl Thru {
    /// Canonicalize the provider-specific "round finished" spellings (`F`, `F*`, `Finished`)
    /// to 18; parse integers; pass anything else through.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        let unmarked = trimmed.strip_suffix('*').unwrap_or(trimmed).trim();
        if FINISHED_MARKERS
            .iter()
            .any(|marker| unmarked.eq_ignore_ascii_case(marker))
        {
            return Self::Holes(HOLES_PER_ROUND);
        }
        match unmarked.parse::<u8>() {
            Ok(holes) => Self::Holes(holes),
            Err(_) if trimmed.is_empty() => Self::Other(NOT_PLAYED.to_string()),
            Err(_) => Self::Other(trimmed.to_string()),
        }
    }

    pub fn from_number(value: i64) -> Self {
        match u8::try_from(value) {
            Ok(holes) => Self::Holes(holes),
            Err(_) => Self::Other(value.to_string()),
        }
    }
}

impl Serialize for Thru {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Holes(holes) => serializer.serialize_u8(*holes),
            Self::Other(value) => serializer.serialize_str(value),
        }
    }
}

/// Hole-by-hole breakdown of one played round.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RoundDetail {
    pub round_values: Vec<String>,
    pub par_values: Vec<u32>,
    pub net_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerScore {
    #[serde(rename = "1")]
    pub round_1: RoundScoreOrStatus,
    #[serde(rename = "2")]
    pub round_2: RoundScoreOrStatus,
    #[serde(rename = "3")]
    pub round_3: RoundScoreOrStatus,
    #[serde(rename = "4")]
    pub round_4: RoundScoreOrStatus,
    pub name: String,
    pub strokes: Option<u32>,
    pub pos: Position,
    pub thru: Thru,
    pub today: String,
    pub total: String,
    /// Keyed by round number; only rounds with at least one valid hole score appear.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_details: Option<BTreeMap<u8, RoundDetail>>,
}

impl PlayerScore {
    pub fn rounds(&self) -> [&RoundScoreOrStatus; 4] {
        [&self.round_1, &self.round_2, &self.round_3, &self.round_4]
    }

    pub fn rounds_mut(&mut self) -> [&mut RoundScoreOrStatus; 4] {
        [
            &mut self.round_1,
            &mut self.round_2,
            &mut self.round_3,
            &mut self.round_4,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalEventRecord {
    pub name: String,
    pub start: String,
    pub end: String,
    pub course: String,
    /// Upstream leaderboard order.
    pub scores: Vec<PlayerScore>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Express a score relative to par: `E`, `+N` or `-N`.
pub fn format_net_score(net: i64) -> String {
    match net {
        0 => "E".to_string(),
        n if n > 0 => format!("+{n}"),
        n => n.to_string(),
    }
}
