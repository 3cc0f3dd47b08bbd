//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    collections::{BTreeMap, HashMap},
    num::NonZeroU64,
    path::PathBuf,
    str::FromStr,
};

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use time::{Date, macros::format_description};
use tracing::level_filters::LevelFilter;

use crate::domain::ids::Tour;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "fairway";
const ENV_PREFIX: &str = "FAIRWAY";
const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;
const DEFAULT_ARCHIVE_ROOT: &str = "archive";
const DEFAULT_SCHEDULE_BUCKET: &str = "schedules";
const DEFAULT_EVENT_BUCKET: &str = "events";
const DEFAULT_RANKINGS_BUCKET: &str = "rankings";
const DEFAULT_CUTOVER_YEAR: i32 = crate::application::schedule::DEFAULT_CUTOVER_YEAR;
const MIN_SEASON: i32 = 1900;
const MAX_SEASON: i32 = 9999;

/// Command-line arguments for the Fairway binary.
#[derive(Debug, Parser)]
#[command(
    name = "fairway",
    version,
    about = "Golf tournament archive and leaderboard normalizer"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "FAIRWAY_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the normalized schedule of a season.
    Schedule(ScheduleArgs),
    /// Print the canonical leaderboard of one event.
    Event(EventArgs),
    /// List finished events that have no archived leaderboard yet.
    Pending(PendingArgs),
    /// Validate a raw payload file and write it to the archive.
    Import(ImportArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SeasonArgs {
    /// Tour slug, e.g. `pga`.
    #[arg(long, value_name = "TOUR")]
    pub tour: Tour,

    /// Season year.
    #[arg(long, value_name = "YEAR")]
    pub year: i32,
}

#[derive(Debug, Args, Clone)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub season: SeasonArgs,
}

#[derive(Debug, Args, Clone)]
pub struct EventArgs {
    #[command(flatten)]
    pub season: SeasonArgs,

    /// Event id: a schedule position or an upstream key, depending on the season.
    #[arg(long = "event", value_name = "ID")]
    pub event_id: String,

    /// Include hole-by-hole round details.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub details: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PendingArgs {
    #[command(flatten)]
    pub season: SeasonArgs,

    /// Reference day (YYYY-MM-DD); defaults to today in UTC.
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub today: Option<Date>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    Schedule,
    Event,
    Rankings,
}

#[derive(Debug, Args, Clone)]
pub struct ImportArgs {
    /// Data domain the payload belongs to.
    #[arg(long, value_enum, value_name = "BUCKET")]
    pub bucket: RecordKind,

    #[command(flatten)]
    pub season: SeasonArgs,

    /// Event id, required for event payloads.
    #[arg(long = "event", value_name = "ID", required_if_eq("bucket", "event"))]
    pub event_id: Option<String>,

    /// Rankings week, required for rankings payloads.
    #[arg(long, value_name = "WEEK", required_if_eq("bucket", "rankings"))]
    pub week: Option<u8>,

    /// Raw JSON payload to archive.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the cache entry lifetime.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS", global = true)]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the archive root directory.
    #[arg(long = "archive-root", value_name = "PATH", global = true)]
    pub archive_root: Option<PathBuf>,

    /// Override the first season addressed by upstream key.
    #[arg(long = "cutover-year", value_name = "YEAR", global = true)]
    pub cutover_year: Option<i32>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub archive: ArchiveSettings,
    pub identifiers: IdentifierSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl_seconds: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    pub root: PathBuf,
    pub schedule_bucket: String,
    pub event_bucket: String,
    pub rankings_bucket: String,
}

#[derive(Debug, Clone)]
pub struct IdentifierSettings {
    pub cutover_year: i32,
    pub tour_cutovers: BTreeMap<Tour, i32>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    archive: RawArchiveSettings,
    identifiers: RawIdentifierSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(root) = overrides.archive_root.as_ref() {
            self.archive.root = Some(root.clone());
        }
        if let Some(year) = overrides.cutover_year {
            self.identifiers.cutover_year = Some(year);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache,
            archive,
            identifiers,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;
        let archive = build_archive_settings(archive)?;
        let identifiers = build_identifier_settings(identifiers)?;

        Ok(Self {
            logging,
            cache,
            archive,
            identifiers,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    let ttl_seconds = NonZeroU64::new(ttl)
        .ok_or_else(|| LoadError::invalid("cache.ttl_seconds", "must be greater than zero"))?;
    i64::try_from(ttl).map_err(|_| {
        LoadError::invalid("cache.ttl_seconds", "value exceeds supported range for i64")
    })?;

    Ok(CacheSettings { ttl_seconds })
}

fn build_archive_settings(archive: RawArchiveSettings) -> Result<ArchiveSettings, LoadError> {
    let root = archive
        .root
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_ROOT));
    if root.as_os_str().is_empty() {
        return Err(LoadError::invalid("archive.root", "path must not be empty"));
    }

    let schedule_bucket = bucket_name(
        archive.schedule_bucket,
        DEFAULT_SCHEDULE_BUCKET,
        "archive.schedule_bucket",
    )?;
    let event_bucket = bucket_name(
        archive.event_bucket,
        DEFAULT_EVENT_BUCKET,
        "archive.event_bucket",
    )?;
    let rankings_bucket = bucket_name(
        archive.rankings_bucket,
        DEFAULT_RANKINGS_BUCKET,
        "archive.rankings_bucket",
    )?;

    if schedule_bucket == event_bucket
        || schedule_bucket == rankings_bucket
        || event_bucket == rankings_bucket
    {
        return Err(LoadError::invalid(
            "archive",
            "schedule, event and rankings buckets must be distinct",
        ));
    }

    Ok(ArchiveSettings {
        root,
        schedule_bucket,
        event_bucket,
        rankings_bucket,
    })
}

fn build_identifier_settings(
    identifiers: RawIdentifierSettings,
) -> Result<IdentifierSettings, LoadError> {
    let cutover_year = identifiers.cutover_year.unwrap_or(DEFAULT_CUTOVER_YEAR);
    season(cutover_year, "identifiers.cutover_year")?;

    let mut tour_cutovers = BTreeMap::new();
    for (tour, year) in identifiers.tour_cutovers.unwrap_or_default() {
        let tour = Tour::parse(&tour)
            .map_err(|err| LoadError::invalid("identifiers.tour_cutovers", err.to_string()))?;
        season(year, "identifiers.tour_cutovers")?;
        tour_cutovers.insert(tour, year);
    }

    Ok(IdentifierSettings {
        cutover_year,
        tour_cutovers,
    })
}

fn bucket_name(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    let name = value
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| default.to_string());
    if name.is_empty() {
        return Err(LoadError::invalid(key, "bucket name must not be empty"));
    }
    if name.starts_with('.') {
        return Err(LoadError::invalid(key, "bucket name must not start with `.`"));
    }
    if let Some(bad) = name
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
    {
        return Err(LoadError::invalid(
            key,
            format!("bucket name contains unsupported character `{bad}`"),
        ));
    }
    Ok(name)
}

fn season(year: i32, key: &'static str) -> Result<i32, LoadError> {
    if !(MIN_SEASON..=MAX_SEASON).contains(&year) {
        return Err(LoadError::invalid(
            key,
            format!("year must be between {MIN_SEASON} and {MAX_SEASON}, got {year}"),
        ));
    }
    Ok(year)
}

fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawArchiveSettings {
    root: Option<PathBuf>,
    schedule_bucket: Option<String>,
    event_bucket: Option<String>,
    rankings_bucket: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawIdentifierSettings {
    cutover_year: Option<i32>,
    tour_cutovers: Option<HashMap<String, i32>>,
}
