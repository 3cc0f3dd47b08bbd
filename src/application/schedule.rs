//! Schedule normalization and event lookup.
//!
//! A season's schedule is normalized into a sorted, de-duplicated list of tour stops. Events
//! inside it are addressed under one of two regimes chosen by season:
//!
//! - **positional** (before the cutover): the event id is the 0-based index into the sorted
//!   schedule;
//! - **key** (cutover onwards): the event id is the upstream-assigned key carried by each
//!   entry. Mid-season revisions (cancellations, reorderings) shift positions but never keys,
//!   which is why newer seasons are addressed by key.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::loose::{Loose, text_of};
use crate::application::storage::RawPayload;
use crate::domain::ids::{EventRef, Tour};
use crate::domain::schedule::{
    CourseRef, ScheduleEntry, Tournament, TournamentId, parse_schedule_date,
};

/// First season addressed by stable key.
pub const DEFAULT_CUTOVER_YEAR: i32 = 2022;

const AMATEUR_SUFFIXES: [&str; 2] = ["- amateurs", "(amateurs)"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRegime {
    Positional,
    Key,
}

/// Chooses the event regime for a (tour, year).
///
/// A tour may switch providers in a different season than the rest, so each tour can carry
/// its own cutover year.
#[derive(Debug, Clone)]
pub struct RegimePolicy {
    cutover_year: i32,
    tour_cutovers: BTreeMap<Tour, i32>,
}

impl Default for RegimePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOVER_YEAR)
    }
}

impl From<&crate::config::IdentifierSettings> for RegimePolicy {
    fn from(settings: &crate::config::IdentifierSettings) -> Self {
        Self {
            cutover_year: settings.cutover_year,
            tour_cutovers: settings.tour_cutovers.clone(),
        }
    }
}

impl RegimePolicy {
    pub fn new(cutover_year: i32) -> Self {
        Self {
            cutover_year,
            tour_cutovers: BTreeMap::new(),
        }
    }

    pub fn with_tour_cutover(mut self, tour: Tour, cutover_year: i32) -> Self {
        self.tour_cutovers.insert(tour, cutover_year);
        self
    }

    pub fn cutover_for(&self, tour: &Tour) -> i32 {
        self.tour_cutovers
            .get(tour)
            .copied()
            .unwrap_or(self.cutover_year)
    }

    pub fn regime(&self, tour: &Tour, year: i32) -> EventRegime {
        if year < self.cutover_for(tour) {
            EventRegime::Positional
        } else {
            EventRegime::Key
        }
    }
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("schedule payload matches no known shape")]
    Shape,
    #[error("tour stop {index} is malformed: {source}")]
    Stop {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("tour stop `{tournament}` has no `{field}`")]
    MissingField {
        tournament: String,
        field: &'static str,
    },
    #[error("tour stop `{tournament}` has unreadable `{field}` `{value}`")]
    InvalidDate {
        tournament: String,
        field: &'static str,
        value: String,
    },
}

/// Why an event id could not be resolved against a schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("event id `{event_id}` is not a schedule position")]
    InvalidIndex { event_id: String },
    #[error("schedule position {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("schedule entry at position {position} has no stable key")]
    MissingKey { position: usize },
    #[error("no schedule entry has key `{key}`")]
    UnknownKey { key: String },
}

impl LookupError {
    /// True when the schedule itself breaks the upstream contract, as opposed to the caller
    /// asking for an id that is not there.
    pub fn is_malformed_schedule(&self) -> bool {
        matches!(self, LookupError::MissingKey { .. })
    }

    /// Structured `reason` field for logs.
    pub fn reason(&self) -> &'static str {
        match self {
            LookupError::InvalidIndex { .. } => "invalid_event_id",
            LookupError::IndexOutOfRange { .. } => "index_out_of_range",
            LookupError::MissingKey { .. } => "malformed_schedule",
            LookupError::UnknownKey { .. } => "unknown_key",
        }
    }
}

const ENVELOPE_FIELDS: [&str; 2] = ["schedule", "tournaments"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTourStop {
    #[serde(alias = "start_date", alias = "start")]
    start_date: Option<Loose>,
    #[serde(alias = "end_date", alias = "end")]
    end_date: Option<Loose>,
    tournament: RawTournament,
    purse: Option<Loose>,
    winner: Option<Value>,
    key: Option<Loose>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTournament {
    name: String,
    #[serde(alias = "tournamentId", alias = "tournament_id")]
    id: Loose,
    year: Option<Loose>,
    tour: Option<String>,
    #[serde(default)]
    courses: Vec<RawCourse>,
    #[serde(alias = "course_details")]
    course_details: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawCourse {
    name: String,
    id: Option<Loose>,
    location: Option<String>,
}

/// Normalize a raw schedule (bare array or legacy wrapper) into schedule order.
pub fn normalize(raw: &RawPayload) -> Result<Vec<ScheduleEntry>, ScheduleError> {
    let stops = raw_stops(raw).ok_or(ScheduleError::Shape)?;

    let mut entries = Vec::with_capacity(stops.len());
    for (index, stop) in stops.iter().enumerate() {
        let stop = RawTourStop::deserialize(stop)
            .map_err(|source| ScheduleError::Stop { index, source })?;
        if is_amateur_companion(&stop.tournament.name) {
            debug!(tournament = %stop.tournament.name, "Skipping amateur companion event");
            continue;
        }
        entries.push(entry_from_raw(stop)?);
    }

    entries.sort_by(ScheduleEntry::schedule_order);
    entries.dedup_by(|later, earlier| {
        later.tournament.id == earlier.tournament.id && later.start_date == earlier.start_date
    });
    Ok(entries)
}

/// The tour-stop array: the payload itself or its envelope field.
fn raw_stops(raw: &RawPayload) -> Option<&Vec<Value>> {
    match raw {
        Value::Array(stops) => Some(stops),
        Value::Object(envelope) => ENVELOPE_FIELDS
            .iter()
            .find_map(|field| envelope.get(*field))
            .and_then(Value::as_array),
        _ => None,
    }
}

/// True when `raw` normalizes into a schedule.
pub fn is_valid(raw: &RawPayload) -> bool {
    normalize(raw).is_ok()
}

fn entry_from_raw(stop: RawTourStop) -> Result<ScheduleEntry, ScheduleError> {
    let RawTourStop {
        start_date,
        end_date,
        tournament,
        purse,
        winner,
        key,
    } = stop;

    let start_date =
        text_of(start_date.as_ref()).ok_or_else(|| ScheduleError::MissingField {
            tournament: tournament.name.clone(),
            field: "startDate",
        })?;
    let end_date = text_of(end_date.as_ref()).unwrap_or_else(|| start_date.clone());
    for (field, value) in [("startDate", &start_date), ("endDate", &end_date)] {
        if parse_schedule_date(value).is_none() {
            return Err(ScheduleError::InvalidDate {
                tournament: tournament.name.clone(),
                field,
                value: value.clone(),
            });
        }
    }

    let courses = tournament
        .courses
        .into_iter()
        .map(|course| CourseRef {
            name: course.name,
            id: text_of(course.id.as_ref()),
            location: course.location,
        })
        .collect();

    Ok(ScheduleEntry {
        start_date,
        end_date,
        tournament: Tournament {
            name: tournament.name,
            id: TournamentId::new(tournament.id.text()),
            year: tournament
                .year
                .as_ref()
                .and_then(Loose::int)
                .and_then(|year| i32::try_from(year).ok()),
            tour: tournament.tour,
            courses,
            course_details: tournament.course_details.filter(|value| !value.is_null()),
        },
        purse: text_of(purse.as_ref()),
        winner: winner.filter(|value| !value.is_null()),
        key: text_of(key.as_ref()),
    })
}

fn is_amateur_companion(name: &str) -> bool {
    let lowered = name.trim().to_ascii_lowercase();
    AMATEUR_SUFFIXES
        .iter()
        .any(|suffix| lowered.ends_with(suffix))
}

/// Resolve an external event id to its position and entry.
pub fn lookup_event<'a>(
    entries: &'a [ScheduleEntry],
    event_id: &str,
    regime: EventRegime,
) -> Result<(usize, &'a ScheduleEntry), LookupError> {
    let event_id = event_id.trim();
    match regime {
        EventRegime::Positional => {
            let index = event_id
                .parse::<usize>()
                .map_err(|_| LookupError::InvalidIndex {
                    event_id: event_id.to_string(),
                })?;
            entries
                .get(index)
                .map(|entry| (index, entry))
                .ok_or(LookupError::IndexOutOfRange {
                    index,
                    len: entries.len(),
                })
        }
        EventRegime::Key => {
            for (position, entry) in entries.iter().enumerate() {
                match entry.key.as_deref() {
                    None => return Err(LookupError::MissingKey { position }),
                    Some(key) if key == event_id => return Ok((position, entry)),
                    Some(_) => {}
                }
            }
            Err(LookupError::UnknownKey {
                key: event_id.to_string(),
            })
        }
    }
}

/// Resolve an external event id, reporting failures and returning `None`.
pub fn find_event<'a>(
    entries: &'a [ScheduleEntry],
    event_id: &str,
    regime: EventRegime,
) -> Option<&'a ScheduleEntry> {
    match lookup_event(entries, event_id, regime) {
        Ok((_, entry)) => Some(entry),
        Err(err) => {
            report_lookup_failure(&err, event_id);
            None
        }
    }
}

/// Log a lookup failure; an unknown key is an ordinary miss, everything else is a warning.
pub fn report_lookup_failure(err: &LookupError, event_id: &str) {
    match err {
        LookupError::UnknownKey { .. } => {
            debug!(event_id, reason = err.reason(), "Event lookup failed")
        }
        _ => warn!(event_id, reason = err.reason(), error = %err, "Event lookup failed"),
    }
}

/// Event reference for the entry at `index`, under the same regime split as lookups.
pub fn get_event_id(
    entries: &[ScheduleEntry],
    index: usize,
    regime: EventRegime,
) -> Option<EventRef> {
    let entry = entries.get(index)?;
    match regime {
        EventRegime::Positional => Some(EventRef::Index(index)),
        EventRegime::Key => match entry.key.as_ref() {
            Some(key) => Some(EventRef::Key(key.clone())),
            None => {
                let err = LookupError::MissingKey { position: index };
                report_lookup_failure(&err, &index.to_string());
                None
            }
        },
    }
}

/// Interpret an external event id without a schedule (for direct archive writes).
pub fn parse_event_ref(event_id: &str, regime: EventRegime) -> Result<EventRef, LookupError> {
    let event_id = event_id.trim();
    match regime {
        EventRegime::Positional => event_id
            .parse::<usize>()
            .map(EventRef::Index)
            .map_err(|_| LookupError::InvalidIndex {
                event_id: event_id.to_string(),
            }),
        EventRegime::Key if event_id.is_empty() => Err(LookupError::UnknownKey {
            key: String::new(),
        }),
        EventRegime::Key => Ok(EventRef::Key(event_id.to_string())),
    }
}
