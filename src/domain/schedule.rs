//! Normalized season schedule records.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use time::Date;
use time::macros::format_description;

/// Upstream tournament identifier.
///
/// Ordering is numeric when both sides parse as integers and lexicographic otherwise, so
/// `"9"` sorts before `"10"` while provider ids like `"R2023016"` still compare sensibly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TournamentId(String);

impl TournamentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for TournamentId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(left), Ok(right)) => left.cmp(&right).then_with(|| self.0.cmp(&other.0)),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for TournamentId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TournamentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub name: String,
    pub id: TournamentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tour: Option<String>,
    pub courses: Vec<CourseRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_details: Option<Value>,
}

/// One tour stop in a normalized schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub start_date: String,
    pub end_date: String,
    pub tournament: Tournament,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Value>,
    /// Stable upstream key; present only for key-regime seasons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ScheduleEntry {
    /// Schedule order: start date, then tournament id.
    pub fn schedule_order(&self, other: &Self) -> Ordering {
        self.start_day()
            .cmp(&other.start_day())
            .then_with(|| self.start_date.cmp(&other.start_date))
            .then_with(|| self.tournament.id.cmp(&other.tournament.id))
    }

    pub fn start_day(&self) -> Option<Date> {
        parse_schedule_date(&self.start_date)
    }

    pub fn end_day(&self) -> Option<Date> {
        parse_schedule_date(&self.end_date)
    }

    /// Name of the primary course, if the schedule lists any.
    pub fn primary_course(&self) -> Option<&str> {
        self.tournament
            .courses
            .first()
            .map(|course| course.name.as_str())
    }
}

/// Calendar day of an upstream schedule date.
///
/// Upstream sends either a bare `YYYY-MM-DD` or a timestamp starting with one; anything
/// else is unreadable.
pub fn parse_schedule_date(value: &str) -> Option<Date> {
    let day = value.trim().get(..10)?;
    Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
}
