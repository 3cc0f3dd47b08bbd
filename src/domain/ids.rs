//! Identifier scheme for cache and archive keys.
//!
//! Every key handed to the payload cache or an archive bucket is produced here, so the same
//! logical schedule or event always maps to the same string. Keys have the shape
//! `{tour}/{year}/...`; tours are restricted to a path-safe alphabet and upstream event keys
//! are escaped, which keeps distinct (tour, year, event) triples from ever colliding.

use std::fmt::{self, Write as FmtWrite};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

const SCHEDULE_SEGMENT: &str = "schedule";
const EVENTS_SEGMENT: &str = "events";
const RANKINGS_SEGMENT: &str = "rankings";
const INDEX_PREFIX: char = 'i';
const KEY_PREFIX: char = 'k';
const ESCAPE_MARKER: char = '~';

/// A tour slug such as `pga`, `euro` or `lpga`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tour(String);

impl Tour {
    /// Parse a tour slug, lowercasing it and rejecting characters outside `[a-z0-9-]`.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::validation("tour", "tour must not be empty"));
        }
        if normalized.starts_with('-') {
            return Err(DomainError::validation(
                "tour",
                format!("`{normalized}` must not start with `-`"),
            ));
        }
        if let Some(bad) = normalized
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-'))
        {
            return Err(DomainError::validation(
                "tour",
                format!("`{normalized}` contains unsupported character `{bad}`"),
            ));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tour {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Tour {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Tour> for String {
    fn from(tour: Tour) -> Self {
        tour.0
    }
}

/// How an event is addressed within one season's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventRef {
    /// 0-based position in the normalized schedule (positional regime).
    Index(usize),
    /// Upstream-assigned stable key (key regime).
    Key(String),
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventRef::Index(index) => write!(f, "{index}"),
            EventRef::Key(key) => f.write_str(key),
        }
    }
}

/// A cache/archive key. Only constructible through the functions in this module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveKey(String);

impl ArchiveKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArchiveKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Key of the schedule record for a (tour, year).
pub fn schedule_id(year: i32, tour: &Tour) -> ArchiveKey {
    ArchiveKey(format!("{tour}/{year}/{SCHEDULE_SEGMENT}"))
}

/// Key of the event record for a (tour, year, event).
pub fn event_id(year: i32, tour: &Tour, event: &EventRef) -> ArchiveKey {
    let reference = match event {
        EventRef::Index(index) => format!("{INDEX_PREFIX}{index}"),
        EventRef::Key(key) => format!("{KEY_PREFIX}{}", escape_segment(key)),
    };
    ArchiveKey(format!("{tour}/{year}/{EVENTS_SEGMENT}/{reference}"))
}

/// Key of the world-rankings snapshot for a (tour, year, week).
pub fn rankings_id(year: i32, tour: &Tour, week: u8) -> ArchiveKey {
    ArchiveKey(format!("{tour}/{year}/{RANKINGS_SEGMENT}/w{week:02}"))
}

fn escape_segment(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            output.push(char::from(byte));
        } else {
            let _ = write!(output, "{ESCAPE_MARKER}{byte:02X}");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn pga() -> Tour {
        Tour::parse("PGA").expect("valid tour")
    }

    #[test]
    fn tour_is_lowercased_and_validated() {
        assert_eq!(pga().as_str(), "pga");
        assert!(Tour::parse("").is_err());
        assert!(Tour::parse("pga/euro").is_err());
        assert!(Tour::parse("-pga").is_err());
        assert_eq!(Tour::parse(" korn-ferry ").expect("valid").as_str(), "korn-ferry");
    }

    #[test]
    fn identifiers_are_deterministic() {
        let tour = pga();
        assert_eq!(
            event_id(2023, &tour, &EventRef::Key("401465".into())),
            event_id(2023, &tour, &EventRef::Key("401465".into()))
        );
        assert_eq!(schedule_id(2021, &tour).as_str(), "pga/2021/schedule");
        assert_eq!(
            event_id(2021, &tour, &EventRef::Index(4)).as_str(),
            "pga/2021/events/i4"
        );
        assert_eq!(rankings_id(2021, &tour, 7).as_str(), "pga/2021/rankings/w07");
    }

    #[test]
    fn index_and_key_with_same_text_do_not_collide() {
        let tour = pga();
        assert_ne!(
            event_id(2022, &tour, &EventRef::Index(3)),
            event_id(2022, &tour, &EventRef::Key("3".into()))
        );
    }

    #[test]
    fn escaped_keys_do_not_collide() {
        let tour = pga();
        let keys = ["a/b", "a~2Fb", "a b", "a_b", "R2023016", "r2023016"];
        let ids: HashSet<_> = keys
            .iter()
            .map(|key| event_id(2023, &tour, &EventRef::Key((*key).to_string())))
            .collect();
        assert_eq!(ids.len(), keys.len());
        assert_eq!(
            event_id(2023, &tour, &EventRef::Key("a/b".into())).as_str(),
            "pga/2023/events/ka~2Fb"
        );
    }

    #[test]
    fn tours_and_years_partition_the_key_space() {
        let euro = Tour::parse("euro").expect("valid tour");
        let event = EventRef::Index(0);
        assert_ne!(event_id(2020, &pga(), &event), event_id(2020, &euro, &event));
        assert_ne!(event_id(2020, &pga(), &event), event_id(2021, &pga(), &event));
        assert_ne!(schedule_id(2020, &pga()).as_str(), event_id(2020, &pga(), &event).as_str());
    }
}
