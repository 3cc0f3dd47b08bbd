use std::{io::Write, path::Path, process, sync::Arc};

use fairway::{
    application::{
        archive::Archive,
        error::AppError,
        resolver::{FetchResult, NoFetch, TieredResolver},
        service::{ImportTarget, TournamentService},
        schedule::RegimePolicy,
        storage::{ObjectStore, PayloadCache, RawPayload},
    },
    cache::{CacheConfig, TtlCache},
    config,
    domain::schedule::ScheduleEntry,
    infra::{error::InfraError, object_store::FsObjectStore, telemetry},
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

/// The binary replays archived data only; live transports are wired by embedding services.
type NoEventFetch = fn(ScheduleEntry) -> std::future::Ready<FetchResult>;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(
            error = %error,
            chain = %report.chain(),
            source = report.source,
            "application error"
        );
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = %report.chain(), "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let service = build_service(&settings)?;

    match cli_args.command {
        config::Command::Schedule(args) => run_schedule(&service, args).await,
        config::Command::Event(args) => run_event(&service, args).await,
        config::Command::Pending(args) => run_pending(&service, args).await,
        config::Command::Import(args) => run_import(&service, args).await,
    }
}

fn build_service(settings: &config::Settings) -> Result<TournamentService, AppError> {
    let store: Arc<dyn ObjectStore> = Arc::new(
        FsObjectStore::new(settings.archive.root.clone()).map_err(InfraError::from)?,
    );
    let cache: Arc<dyn PayloadCache> =
        Arc::new(TtlCache::new(&CacheConfig::from(&settings.cache)));
    let resolver = |bucket: &str| {
        TieredResolver::new(
            cache.clone(),
            Arc::new(Archive::new(store.clone(), bucket.to_string())),
        )
    };

    info!(
        root = %settings.archive.root.display(),
        cutover_year = settings.identifiers.cutover_year,
        "Archive opened"
    );

    Ok(TournamentService::new(
        resolver(&settings.archive.schedule_bucket),
        resolver(&settings.archive.event_bucket),
        resolver(&settings.archive.rankings_bucket),
        RegimePolicy::from(&settings.identifiers),
    ))
}

async fn run_schedule(
    service: &TournamentService,
    args: config::ScheduleArgs,
) -> Result<(), AppError> {
    let config::SeasonArgs { tour, year } = args.season;
    let schedule = service
        .schedule(&tour, year, None::<NoFetch>)
        .await?
        .ok_or_else(|| AppError::not_found(format!("schedule for {tour} {year}")))?;
    print_json(&schedule)
}

async fn run_event(service: &TournamentService, args: config::EventArgs) -> Result<(), AppError> {
    let config::SeasonArgs { tour, year } = args.season;
    let record = service
        .event(
            &tour,
            year,
            &args.event_id,
            args.details,
            None::<NoEventFetch>,
        )
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("event `{}` for {tour} {year}", args.event_id))
        })?;
    print_json(&record)
}

async fn run_pending(
    service: &TournamentService,
    args: config::PendingArgs,
) -> Result<(), AppError> {
    let config::SeasonArgs { tour, year } = args.season;
    let today = args
        .today
        .unwrap_or_else(|| OffsetDateTime::now_utc().date());
    let pending = service.unarchived_events(&tour, year, today).await?;
    print_json(&pending)
}

async fn run_import(service: &TournamentService, args: config::ImportArgs) -> Result<(), AppError> {
    let config::SeasonArgs { tour, year } = args.season;
    let target = match args.bucket {
        config::RecordKind::Schedule => ImportTarget::Schedule,
        config::RecordKind::Event => ImportTarget::Event(
            args.event_id
                .ok_or_else(|| AppError::validation("--event is required for event payloads"))?,
        ),
        config::RecordKind::Rankings => ImportTarget::Rankings(
            args.week
                .ok_or_else(|| AppError::validation("--week is required for rankings payloads"))?,
        ),
    };

    let payload = read_payload(&args.file).await?;
    let key = service.import(&tour, year, &target, payload).await?;
    info!(
        target = "fairway::import",
        key = %key,
        path = %args.file.display(),
        "Import completed"
    );
    Ok(())
}

async fn read_payload(path: &Path) -> Result<RawPayload, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| AppError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    writeln!(handle).map_err(InfraError::from)?;
    Ok(())
}
