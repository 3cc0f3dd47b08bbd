//! Leaderboard normalization through the public service API.

use std::sync::Arc;

use fairway::application::archive::Archive;
use fairway::application::event::{self, SchemaVersion};
use fairway::application::resolver::{FetchResult, TieredResolver};
use fairway::application::schedule::{self, EventRegime, RegimePolicy};
use fairway::application::service::{ImportTarget, TournamentService};
use fairway::cache::{CacheConfig, TtlCache};
use fairway::domain::event::{Position, RoundScoreOrStatus, StatusToken, Thru};
use fairway::domain::ids::{EventRef, Tour};
use fairway::domain::schedule::ScheduleEntry;
use fairway::infra::object_store::MemoryObjectStore;
use serde_json::{Value, json};

type NoEventFetch = fn(ScheduleEntry) -> std::future::Ready<FetchResult>;

fn service() -> TournamentService {
    let store = Arc::new(MemoryObjectStore::new());
    let cache = Arc::new(TtlCache::new(&CacheConfig::default()));
    let resolver = |bucket: &str| {
        TieredResolver::new(cache.clone(), Arc::new(Archive::new(store.clone(), bucket)))
    };
    TournamentService::new(
        resolver("schedules"),
        resolver("events"),
        resolver("rankings"),
        RegimePolicy::default(),
    )
}

fn pga() -> Tour {
    Tour::parse("pga").expect("tour")
}

fn pebble_beach_schedule(year: i32, keyed: bool) -> Value {
    let mut stops = vec![
        json!({
            "startDate": format!("{year}-02-04"),
            "endDate": format!("{year}-02-07"),
            "tournament": {"name": "Waste Management Phoenix Open", "id": "3", "courses": [{"name": "TPC Scottsdale"}]},
            "key": "wm"
        }),
        json!({
            "startDate": format!("{year}-02-11"),
            "endDate": format!("{year}-02-14"),
            "tournament": {"name": "AT&T Pebble Beach Pro-Am (Amateurs)", "id": "5", "courses": [{"name": "Pebble Beach Golf Links"}]},
            "key": "pb-am"
        }),
        json!({
            "startDate": format!("{year}-02-11"),
            "endDate": format!("{year}-02-14"),
            "tournament": {"name": "AT&T Pebble Beach Pro-Am", "id": "5", "courses": [{"name": "Pebble Beach Golf Links"}]},
            "key": "pb"
        }),
    ];
    if !keyed {
        for stop in &mut stops {
            stop.as_object_mut().expect("stop").remove("key");
        }
    }
    json!({"schedule": stops})
}

fn graphql_leaderboard() -> Value {
    json!({"data": {"leaderboard": {"players": [
        {
            "__typename": "PlayerRowV3",
            "player": {"displayName": "Daniel Berger"},
            "scoringData": {
                "position": "1", "total": "-18", "thru": "F", "score": "-7",
                "totalStrokes": "270", "rounds": ["67", "72", "66", "65"]
            },
            "scorecard": {"rounds": [{"roundNumber": 4, "holes": [
                {"holeNumber": 18, "par": 5, "score": "3"},
                {"holeNumber": 1, "par": 4, "score": "4"}
            ]}]}
        },
        {
            "__typename": "PlayerRowV3",
            "player": {"displayName": "Secondary Cut"},
            "scoringData": {
                "position": "CUT", "total": "+2", "thru": "F", "score": "+5",
                "totalStrokes": "218", "rounds": ["70", "71", "77", null]
            }
        },
        {
            "__typename": "PlayerRowV3",
            "player": {"displayName": "Weekend Off"},
            "scoringData": {
                "position": "CUT", "total": "+6", "thru": "F", "score": "+3",
                "totalStrokes": "150", "rounds": ["75", "75", "", ""]
            }
        }
    ]}}})
}

#[tokio::test]
async fn key_regime_event_is_normalized_with_details() {
    let service = service();
    let tour = pga();
    service
        .import(&tour, 2023, &ImportTarget::Schedule, pebble_beach_schedule(2023, true))
        .await
        .expect("schedule import");
    service
        .import(&tour, 2023, &ImportTarget::Event("pb".into()), graphql_leaderboard())
        .await
        .expect("event import");

    assert_eq!(
        service.event_refs(&tour, 2023).await.expect("refs"),
        vec![EventRef::Key("wm".into()), EventRef::Key("pb".into())]
    );

    let record = service
        .event(&tour, 2023, "pb", true, None::<NoEventFetch>)
        .await
        .expect("event")
        .expect("present");

    assert_eq!(record.name, "AT&T Pebble Beach Pro-Am");
    assert_eq!(record.course, "Pebble Beach Golf Links");
    assert_eq!(record.end, "2023-02-14");

    let names: Vec<_> = record.scores.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Daniel Berger", "Secondary Cut", "Weekend Off"]);

    let winner = &record.scores[0];
    assert_eq!(winner.thru, Thru::Holes(18));
    let details = winner.round_details.as_ref().expect("details");
    let final_round = &details[&4];
    assert_eq!(final_round.par_values, vec![4, 5]);
    assert_eq!(final_round.net_values, vec!["E", "-2"]);

    let mdf = &record.scores[1];
    assert_eq!(mdf.pos, Position::Status(StatusToken::Mdf));
    assert_eq!(mdf.round_3, RoundScoreOrStatus::Numeric(77));
    assert_eq!(mdf.round_4, RoundScoreOrStatus::Status(StatusToken::Mdf));

    let cut = &record.scores[2];
    assert_eq!(cut.pos, Position::Status(StatusToken::Cut));
    assert_eq!(cut.round_3, RoundScoreOrStatus::Status(StatusToken::Cut));
    assert_eq!(cut.round_4, RoundScoreOrStatus::Status(StatusToken::Cut));
}

#[tokio::test]
async fn positional_regime_skips_amateur_companion_when_indexing() {
    let service = service();
    let tour = pga();
    assert_eq!(service.regime(&tour, 2021), EventRegime::Positional);

    service
        .import(&tour, 2021, &ImportTarget::Schedule, pebble_beach_schedule(2021, false))
        .await
        .expect("schedule import");
    service
        .import(
            &tour,
            2021,
            &ImportTarget::Event("1".into()),
            json!({"scores": [{"name": "Daniel Berger", "pos": "1", "1": 67, "2": 72, "3": 66, "4": 65}]}),
        )
        .await
        .expect("event import");

    let record = service
        .event(&tour, 2021, "1", false, None::<NoEventFetch>)
        .await
        .expect("event")
        .expect("present");
    assert_eq!(record.name, "AT&T Pebble Beach Pro-Am");
    assert_eq!(record.scores[0].round_4, RoundScoreOrStatus::Numeric(65));
}

#[test]
fn schema_detection_is_exclusive_to_container_shape() {
    assert_eq!(SchemaVersion::detect(&graphql_leaderboard()), Some(SchemaVersion::V3));
    assert!(event::is_valid(&graphql_leaderboard()));
    assert!(!event::is_valid(&pebble_beach_schedule(2021, false)));
    assert!(!schedule::is_valid(&graphql_leaderboard()));
}

#[test]
fn canonical_record_json_contract() {
    let entries = schedule::normalize(&pebble_beach_schedule(2023, true)).expect("schedule");
    let record = event::normalize(&graphql_leaderboard(), &entries[1], false).expect("record");
    let json = serde_json::to_value(&record).expect("json");

    assert_eq!(json["name"], "AT&T Pebble Beach Pro-Am");
    let cut = &json["scores"][2];
    assert_eq!(cut["1"], 75);
    assert_eq!(cut["3"], "CUT");
    assert_eq!(cut["4"], "CUT");
    assert_eq!(cut["pos"], "CUT");
    assert_eq!(cut["thru"], 18);
    assert_eq!(cut["today"], "+3");
    assert_eq!(cut["strokes"], 150);
    assert!(cut.get("round_details").is_none());
}
