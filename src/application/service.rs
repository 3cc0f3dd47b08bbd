//! Tournament data facade over the schedule, event and rankings resolvers.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use time::Date;
use tracing::{debug, info, instrument};

use crate::application::archive::ArchiveError;
use crate::application::event::{self, NormalizeError};
use crate::application::resolver::{FetchResult, ResolveError, TieredResolver};
use crate::application::schedule::{self, EventRegime, LookupError, RegimePolicy, ScheduleError};
use crate::application::storage::RawPayload;
use crate::domain::error::DomainError;
use crate::domain::event::CanonicalEventRecord;
use crate::domain::ids::{self, ArchiveKey, EventRef, Tour};
use crate::domain::schedule::ScheduleEntry;

const MAX_RANKINGS_WEEK: u8 = 53;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("no schedule stored for {tour} {year}")]
    ScheduleMissing { tour: Tour, year: i32 },
    #[error("stored schedule for {tour} {year} is unreadable")]
    Schedule {
        tour: Tour,
        year: i32,
        #[source]
        source: ScheduleError,
    },
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("payload for `{key}` is not a recognized {kind}")]
    InvalidPayload { key: String, kind: &'static str },
}

/// Which record an imported payload is archived as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    Schedule,
    Event(String),
    Rankings(u8),
}

/// A finished event with no archived leaderboard yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEvent {
    pub event_id: String,
    pub name: String,
    pub end_date: String,
}

#[derive(Clone)]
pub struct TournamentService {
    schedules: TieredResolver,
    events: TieredResolver,
    rankings: TieredResolver,
    policy: RegimePolicy,
}

impl TournamentService {
    pub fn new(
        schedules: TieredResolver,
        events: TieredResolver,
        rankings: TieredResolver,
        policy: RegimePolicy,
    ) -> Self {
        Self {
            schedules,
            events,
            rankings,
            policy,
        }
    }

    pub fn regime(&self, tour: &Tour, year: i32) -> EventRegime {
        self.policy.regime(tour, year)
    }

    /// Normalized schedule, fetching and archiving it when no tier holds it yet.
    #[instrument(skip(self, tour, live), fields(tour = %tour))]
    pub async fn schedule<F, Fut>(
        &self,
        tour: &Tour,
        year: i32,
        live: Option<F>,
    ) -> Result<Option<Vec<ScheduleEntry>>, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult>,
    {
        let key = ids::schedule_id(year, tour);
        let raw = self
            .schedules
            .resolve_validated(&key, live, schedule::is_valid)
            .await?;
        raw.map(|raw| normalize_schedule(tour, year, &raw))
            .transpose()
    }

    /// Re-fetch a schedule and overwrite the stored record, e.g. after a mid-season revision.
    #[instrument(skip(self, tour, fetch), fields(tour = %tour))]
    pub async fn refresh_schedule<F, Fut>(
        &self,
        tour: &Tour,
        year: i32,
        fetch: F,
    ) -> Result<Option<Vec<ScheduleEntry>>, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult>,
    {
        let key = ids::schedule_id(year, tour);
        let raw = self
            .schedules
            .refresh(&key, fetch, schedule::is_valid)
            .await?;
        raw.map(|raw| normalize_schedule(tour, year, &raw))
            .transpose()
    }

    /// Canonical record of one event.
    ///
    /// The schedule must already be stored; the live fetch, if any, receives the resolved
    /// schedule entry so the collaborator knows which tournament to ask for.
    #[instrument(skip(self, tour, live), fields(tour = %tour))]
    pub async fn event<F, Fut>(
        &self,
        tour: &Tour,
        year: i32,
        event_id: &str,
        include_details: bool,
        live: Option<F>,
    ) -> Result<Option<CanonicalEventRecord>, ServiceError>
    where
        F: FnOnce(ScheduleEntry) -> Fut,
        Fut: Future<Output = FetchResult>,
    {
        let entries = self.stored_schedule(tour, year).await?;
        let regime = self.regime(tour, year);

        let (position, entry) = match schedule::lookup_event(&entries, event_id, regime) {
            Ok(found) => found,
            Err(err) => {
                schedule::report_lookup_failure(&err, event_id);
                if err.is_malformed_schedule() {
                    return Err(err.into());
                }
                return Ok(None);
            }
        };
        let event_ref = schedule::get_event_id(&entries, position, regime)
            .ok_or(LookupError::MissingKey { position })?;
        let key = ids::event_id(year, tour, &event_ref);

        let live = live.map(|fetch| {
            let entry = entry.clone();
            move || fetch(entry)
        });
        let Some(raw) = self
            .events
            .resolve_validated(&key, live, event::is_valid)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(event::normalize_strict(&raw, entry, include_details)?))
    }

    /// Event references of a stored schedule, in schedule order.
    pub async fn event_refs(&self, tour: &Tour, year: i32) -> Result<Vec<EventRef>, ServiceError> {
        let entries = self.stored_schedule(tour, year).await?;
        self.refs_for(&entries, tour, year)
    }

    /// Events that ended before `today` but have no archived leaderboard.
    #[instrument(skip(self, tour), fields(tour = %tour))]
    pub async fn unarchived_events(
        &self,
        tour: &Tour,
        year: i32,
        today: Date,
    ) -> Result<Vec<PendingEvent>, ServiceError> {
        let entries = self.stored_schedule(tour, year).await?;
        let refs = self.refs_for(&entries, tour, year)?;

        let mut pending = Vec::new();
        for (entry, event_ref) in entries.iter().zip(refs) {
            let Some(end) = entry.end_day() else {
                debug!(
                    tournament = %entry.tournament.name,
                    end_date = %entry.end_date,
                    "Skipping event with unreadable end date"
                );
                continue;
            };
            if end >= today {
                continue;
            }
            let key = ids::event_id(year, tour, &event_ref);
            if !self.events.archive().exists(&key).await? {
                pending.push(PendingEvent {
                    event_id: event_ref.to_string(),
                    name: entry.tournament.name.clone(),
                    end_date: entry.end_date.clone(),
                });
            }
        }

        info!(pending = pending.len(), "Planned archive backfill");
        Ok(pending)
    }

    /// Raw world-rankings snapshot for one week; its shape is passed through untouched.
    #[instrument(skip(self, tour, live), fields(tour = %tour))]
    pub async fn rankings<F, Fut>(
        &self,
        tour: &Tour,
        year: i32,
        week: u8,
        live: Option<F>,
    ) -> Result<Option<RawPayload>, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult>,
    {
        let key = rankings_key(tour, year, week)?;
        Ok(self.rankings.resolve(&key, live).await?)
    }

    /// Validate an out-of-band payload and write it through the matching resolver.
    #[instrument(skip(self, tour, payload), fields(tour = %tour))]
    pub async fn import(
        &self,
        tour: &Tour,
        year: i32,
        target: &ImportTarget,
        payload: RawPayload,
    ) -> Result<ArchiveKey, ServiceError> {
        let (resolver, key, valid, kind) = match target {
            ImportTarget::Schedule => (
                &self.schedules,
                ids::schedule_id(year, tour),
                schedule::is_valid(&payload),
                "schedule",
            ),
            ImportTarget::Event(event_id) => {
                let event_ref = schedule::parse_event_ref(event_id, self.regime(tour, year))?;
                (
                    &self.events,
                    ids::event_id(year, tour, &event_ref),
                    event::is_valid(&payload),
                    "leaderboard",
                )
            }
            ImportTarget::Rankings(week) => (
                &self.rankings,
                rankings_key(tour, year, *week)?,
                payload.is_object() || payload.is_array(),
                "rankings snapshot",
            ),
        };

        if !valid {
            return Err(ServiceError::InvalidPayload {
                key: key.to_string(),
                kind,
            });
        }
        resolver.store(&key, payload).await?;
        Ok(key)
    }

    async fn stored_schedule(
        &self,
        tour: &Tour,
        year: i32,
    ) -> Result<Vec<ScheduleEntry>, ServiceError> {
        let key = ids::schedule_id(year, tour);
        match self.schedules.resolve_stored(&key).await? {
            Some(raw) => normalize_schedule(tour, year, &raw),
            None => Err(ServiceError::ScheduleMissing {
                tour: tour.clone(),
                year,
            }),
        }
    }

    fn refs_for(
        &self,
        entries: &[ScheduleEntry],
        tour: &Tour,
        year: i32,
    ) -> Result<Vec<EventRef>, ServiceError> {
        let regime = self.regime(tour, year);
        (0..entries.len())
            .map(|position| {
                schedule::get_event_id(entries, position, regime)
                    .ok_or(ServiceError::Lookup(LookupError::MissingKey { position }))
            })
            .collect()
    }
}

fn normalize_schedule(
    tour: &Tour,
    year: i32,
    raw: &RawPayload,
) -> Result<Vec<ScheduleEntry>, ServiceError> {
    schedule::normalize(raw).map_err(|source| ServiceError::Schedule {
        tour: tour.clone(),
        year,
        source,
    })
}

fn rankings_key(tour: &Tour, year: i32, week: u8) -> Result<ArchiveKey, DomainError> {
    if week == 0 || week > MAX_RANKINGS_WEEK {
        return Err(DomainError::validation(
            "week",
            format!("rankings week must be between 1 and {MAX_RANKINGS_WEEK}, got {week}"),
        ));
    }
    Ok(ids::rankings_id(year, tour, week))
}
