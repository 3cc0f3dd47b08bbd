//! Leaderboard normalization.
//!
//! Every supported upstream format is parsed into version-independent player rows, converted
//! to [`PlayerScore`]s, repaired, and wrapped with header fields taken from the schedule entry.
//! Normalization is pure apart from stamping `created_at`; only raw payloads are stored, so a
//! fix here applies retroactively to everything already archived.

mod details;
mod repair;
mod row;
mod schema;
mod v1;
mod v2;
mod v3;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::loose::text_of;
use crate::application::storage::RawPayload;
use crate::domain::event::{CanonicalEventRecord, PlayerScore};
use crate::domain::schedule::ScheduleEntry;

pub use repair::fix_empty_round_score;
pub use schema::SchemaVersion;

use row::{ParsedLeaderboard, RawHeader};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("payload matches no known leaderboard format")]
    InvalidPayload,
    #[error("{version} leaderboard is malformed")]
    Malformed {
        version: SchemaVersion,
        #[source]
        source: serde_json::Error,
    },
}

/// True when the payload is in a recognized leaderboard format.
pub fn is_valid(raw: &RawPayload) -> bool {
    SchemaVersion::detect(raw).is_some()
}

/// Normalize a leaderboard payload, logging and discarding anything that cannot be read.
pub fn normalize(
    raw: &RawPayload,
    entry: &ScheduleEntry,
    include_details: bool,
) -> Option<CanonicalEventRecord> {
    match normalize_strict(raw, entry, include_details) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(
                tournament = %entry.tournament.name,
                error = %err,
                "Discarding unreadable leaderboard payload"
            );
            None
        }
    }
}

pub fn normalize_strict(
    raw: &RawPayload,
    entry: &ScheduleEntry,
    include_details: bool,
) -> Result<CanonicalEventRecord, NormalizeError> {
    let version = SchemaVersion::detect(raw).ok_or(NormalizeError::InvalidPayload)?;
    let parsed = match version {
        SchemaVersion::V1 => v1::parse(raw),
        SchemaVersion::V2 => v2::parse(raw),
        SchemaVersion::V3 => v3::parse(raw),
    }
    .map_err(|source| NormalizeError::Malformed { version, source })?;

    Ok(build_record(parsed, entry, include_details))
}

fn build_record(
    parsed: ParsedLeaderboard,
    entry: &ScheduleEntry,
    include_details: bool,
) -> CanonicalEventRecord {
    let ParsedLeaderboard { header, rows } = parsed;
    let RawHeader {
        name,
        start,
        end,
        course,
    } = header;

    let scores = rows
        .into_iter()
        .map(|row| {
            let mut score: PlayerScore = row.into_score(include_details);
            fix_empty_round_score(&mut score);
            score
        })
        .collect();

    CanonicalEventRecord {
        name: prefer(&entry.tournament.name, name),
        start: prefer(&entry.start_date, text_of(start.as_ref())),
        end: prefer(&entry.end_date, text_of(end.as_ref())),
        course: prefer(entry.primary_course().unwrap_or_default(), course),
        scores,
        created_at: OffsetDateTime::now_utc(),
    }
}

fn prefer(scheduled: &str, fallback: Option<String>) -> String {
    if scheduled.trim().is_empty() {
        fallback.unwrap_or_default()
    } else {
        scheduled.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::event::{Position, RoundScoreOrStatus, StatusToken, Thru};
    use crate::domain::schedule::{CourseRef, Tournament, TournamentId};

    fn entry() -> ScheduleEntry {
        ScheduleEntry {
            start_date: "2023-04-06".into(),
            end_date: "2023-04-09".into(),
            tournament: Tournament {
                name: "Masters Tournament".into(),
                id: TournamentId::new("14"),
                year: Some(2023),
                tour: Some("pga".into()),
                courses: vec![CourseRef {
                    name: "Augusta National".into(),
                    id: None,
                    location: None,
                }],
                course_details: None,
            },
            purse: None,
            winner: None,
            key: Some("401465508".into()),
        }
    }

    fn v1_payload() -> Value {
        json!({
            "name": "Snapshot Name",
            "course": "Snapshot Course",
            "scores": [
                {"name": "Jon Rahm", "pos": "1", "1": 65, "2": 69, "3": 73, "4": 69,
                 "strokes": 276, "thru": "F", "today": -3, "total": -12},
                {"name": "", "pos": "2"},
                {"name": "Cut Player", "pos": "CUT", "1": "75", "2": "77", "3": "-", "4": "--",
                 "strokes": 152, "thru": 18, "today": "+5", "total": 8},
            ]
        })
    }

    fn v2_payload() -> Value {
        json!({
            "leaderboard": {
                "name": "Page Name",
                "competitors": [
                    {"type": "header", "text": "Projected cut"},
                    {
                        "type": "athlete",
                        "athlete": {"displayName": "Brooks Koepka"},
                        "status": {"position": "T2", "thru": "F*", "today": 0},
                        "score": -8,
                        "strokes": 280,
                        "linescores": [
                            {"period": 2, "value": 67, "holes": [
                                {"hole": 2, "par": 5, "score": 4},
                                {"hole": 1, "par": 4, "score": 4}
                            ]},
                            {"period": 1, "value": 65},
                            {"period": 3, "value": 73, "holes": [
                                {"hole": 1, "par": 4, "score": "-"}
                            ]},
                            {"period": 4, "value": "2:40 PM"}
                        ]
                    },
                    {
                        "type": "athlete",
                        "athlete": {"displayName": "Withdrawn Player"},
                        "status": {"position": "WD"},
                        "linescores": [{"period": 1, "value": 78}]
                    }
                ]
            }
        })
    }

    fn v3_payload() -> Value {
        json!({
            "data": {"leaderboard": {"players": [
                {"__typename": "InformationRow", "displayText": "Projected Cut"},
                {
                    "__typename": "PlayerRowV3",
                    "player": {"displayName": "Phil Mickelson"},
                    "scoringData": {
                        "position": "T2", "total": "-8", "thru": "F", "score": "E",
                        "totalStrokes": "280", "rounds": ["71", "69", "68", "72"]
                    },
                    "scorecard": {"rounds": [
                        {"roundNumber": 1, "holes": [
                            {"holeNumber": 1, "par": 4, "score": "3"},
                            {"holeNumber": 2, "par": 5, "score": "6"}
                        ]},
                        {"roundNumber": 2, "holes": [
                            {"holeNumber": 1, "par": 4, "score": ""}
                        ]}
                    ]}
                },
                {
                    "__typename": "PlayerRowV3",
                    "player": {"displayName": "Made Cut Did Not Finish"},
                    "scoringData": {
                        "position": "CUT", "total": "+6", "thru": "F", "score": "+4",
                        "totalStrokes": "222", "rounds": ["72", "72", "78", "-"]
                    }
                }
            ]}}
        })
    }

    #[test]
    fn validity_follows_schema_detection() {
        assert!(is_valid(&v1_payload()));
        assert!(is_valid(&v2_payload()));
        assert!(is_valid(&v3_payload()));
        assert!(!is_valid(&json!({"leaderboard": null})));
        assert!(normalize(&json!({"unknown": true}), &entry(), false).is_none());
    }

    #[test]
    fn v1_snapshot_rows_map_directly() {
        let record = normalize(&v1_payload(), &entry(), false).expect("record");

        assert_eq!(record.name, "Masters Tournament");
        assert_eq!(record.course, "Augusta National");
        assert_eq!(record.start, "2023-04-06");
        assert_eq!(record.scores.len(), 2);

        let winner = &record.scores[0];
        assert_eq!(winner.name, "Jon Rahm");
        assert_eq!(winner.round_1, RoundScoreOrStatus::Numeric(65));
        assert_eq!(winner.strokes, Some(276));
        assert_eq!(winner.thru, Thru::Holes(18));
        assert_eq!(winner.today, "-3");
        assert_eq!(winner.total, "-12");
        assert!(winner.round_details.is_none());

        let cut = &record.scores[1];
        assert_eq!(cut.pos, Position::Status(StatusToken::Cut));
        assert_eq!(cut.round_3, RoundScoreOrStatus::Status(StatusToken::Cut));
        assert_eq!(cut.round_4, RoundScoreOrStatus::Status(StatusToken::Cut));
        assert_eq!(cut.today, "+5");
        assert_eq!(cut.total, "+8");
    }

    #[test]
    fn v2_page_rows_skip_non_players() {
        let record = normalize(&v2_payload(), &entry(), true).expect("record");
        assert_eq!(record.scores.len(), 2);

        let koepka = &record.scores[0];
        assert_eq!(koepka.name, "Brooks Koepka");
        assert_eq!(koepka.pos, Position::Place("T2".into()));
        assert_eq!(
            koepka.rounds(),
            [
                &RoundScoreOrStatus::Numeric(65),
                &RoundScoreOrStatus::Numeric(67),
                &RoundScoreOrStatus::Numeric(73),
                &RoundScoreOrStatus::TeeTime("2:40 PM".into()),
            ]
        );
        assert_eq!(koepka.thru, Thru::Holes(18));
        assert_eq!(koepka.today, "E");
        assert_eq!(koepka.total, "-8");

        let details = koepka.round_details.as_ref().expect("details requested");
        assert_eq!(details.keys().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(details[&2].net_values, vec!["E", "-1"]);

        let withdrawn = &record.scores[1];
        assert_eq!(withdrawn.round_1, RoundScoreOrStatus::Numeric(78));
        assert_eq!(withdrawn.round_2, RoundScoreOrStatus::Status(StatusToken::Wd));
        assert_eq!(withdrawn.thru, Thru::Other("-".into()));
    }

    #[test]
    fn v3_graphql_rows_and_mdf_repair() {
        let record = normalize(&v3_payload(), &entry(), true).expect("record");
        assert_eq!(record.scores.len(), 2);

        let mickelson = &record.scores[0];
        assert_eq!(mickelson.strokes, Some(280));
        assert_eq!(mickelson.round_4, RoundScoreOrStatus::Numeric(72));
        assert_eq!(mickelson.today, "E");
        let details = mickelson.round_details.as_ref().expect("details requested");
        assert_eq!(details.len(), 1);
        assert_eq!(details[&1].round_values, vec!["3", "6"]);
        assert_eq!(details[&1].par_values, vec![4, 5]);
        assert_eq!(details[&1].net_values, vec!["-1", "+1"]);

        let mdf = &record.scores[1];
        assert_eq!(mdf.pos, Position::Status(StatusToken::Mdf));
        assert_eq!(mdf.round_3, RoundScoreOrStatus::Numeric(78));
        assert_eq!(mdf.round_4, RoundScoreOrStatus::Status(StatusToken::Mdf));
        assert_eq!(mdf.round_details, Some(Default::default()));
    }

    #[test]
    fn header_falls_back_to_payload_fields() {
        let mut bare = entry();
        bare.tournament.name = String::new();
        bare.tournament.courses.clear();

        let record = normalize(&v1_payload(), &bare, false).expect("record");
        assert_eq!(record.name, "Snapshot Name");
        assert_eq!(record.course, "Snapshot Course");

        let record = normalize(&v2_payload(), &bare, false).expect("record");
        assert_eq!(record.name, "Page Name");
        assert_eq!(record.course, "");
    }

    #[test]
    fn malformed_rows_are_reported_strictly() {
        let payload = json!({"scores": [{"name": {"first": "Not", "last": "Text"}}]});
        let err = normalize_strict(&payload, &entry(), false).expect_err("malformed");
        assert!(matches!(
            err,
            NormalizeError::Malformed {
                version: SchemaVersion::V1,
                ..
            }
        ));
        assert!(matches!(
            normalize_strict(&json!([]), &entry(), false),
            Err(NormalizeError::InvalidPayload)
        ));
    }

    #[test]
    fn scores_keep_upstream_order() {
        let payload = json!({"scores": [
            {"name": "Last", "pos": "60"},
            {"name": "First", "pos": "1"},
        ]});
        let record = normalize(&payload, &entry(), false).expect("record");
        let names: Vec<_> = record.scores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Last", "First"]);
    }

    #[test]
    fn record_serializes_with_round_keys() {
        let record = normalize(&v1_payload(), &entry(), false).expect("record");
        let json = serde_json::to_value(&record).expect("serializes");
        let cut = &json["scores"][1];
        assert_eq!(cut["1"], json!(75));
        assert_eq!(cut["3"], json!("CUT"));
        assert_eq!(cut["pos"], json!("CUT"));
        assert!(cut.get("round_details").is_none());
        assert!(json["created_at"].is_string());
    }
}
