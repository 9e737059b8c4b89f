use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use cityweather_core::config::DEFAULT_CREDENTIALS_PATH;
use cityweather_core::location::{METRO_CITIES, TOURIST_PLACES};
use cityweather_core::{DateRange, DateRangeError, LocationError, LocationRegistry};
use cityweather_fetch::ContentType;
use cityweather_store::WriteMode;

use crate::context::RunSettings;
use crate::error::AppError;

/// Built-in location lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// The ten metro cities.
    Metro,
    /// Hill stations and tourist places.
    Tourist,
}

impl Preset {
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Preset::Metro => METRO_CITIES,
            Preset::Tourist => TOURIST_PLACES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Csv,
}

impl From<Format> for ContentType {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ContentType::Json,
            Format::Csv => ContentType::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Overwrite existing (location, date) rows in place.
    Upsert,
    /// Delete the requested range for each location, then insert.
    Replace,
}

impl From<Mode> for WriteMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Upsert => WriteMode::Upsert,
            Mode::Replace => WriteMode::Replace,
        }
    }
}

/// Fetch daily weather for a list of cities into the `weather_data` table.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about)]
pub struct Cli {
    /// Credentials file (api_key plus a mysql or sqlite block).
    #[arg(long, default_value = DEFAULT_CREDENTIALS_PATH)]
    pub config: PathBuf,

    /// First day to fetch, YYYY-MM-DD [default: today]
    #[arg(long)]
    pub start: Option<String>,

    /// Last day to fetch, YYYY-MM-DD [default: --start]
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Location such as "Pune,IN"; repeat for several. Overrides --preset.
    #[arg(long = "city", value_name = "NAME")]
    pub cities: Vec<String>,

    #[arg(long, value_enum, default_value_t = Preset::Metro)]
    pub preset: Preset,

    /// Response encoding requested upstream.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    #[arg(long, value_enum, default_value_t = Mode::Upsert)]
    pub mode: Mode,

    /// Pause between locations, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Per-request HTTP timeout, in seconds.
    #[arg(long, default_value_t = 40)]
    pub timeout_secs: u64,

    /// Directory for raw JSON responses.
    #[arg(long, default_value = "cache")]
    pub cache_dir: PathBuf,

    /// Do not write raw responses to disk.
    #[arg(long)]
    pub no_cache: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn date_range(&self) -> Result<DateRange, DateRangeError> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => DateRange::parse(start, end),
            (Some(start), None) => DateRange::parse(start, start),
            _ => Ok(DateRange::today()),
        }
    }

    pub fn locations(&self) -> Result<LocationRegistry, LocationError> {
        if self.cities.is_empty() {
            LocationRegistry::new(self.preset.names())
        } else {
            LocationRegistry::new(&self.cities)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn run_settings(&self) -> Result<RunSettings, AppError> {
        let mut settings = RunSettings::new(self.locations()?, self.date_range()?);
        settings.content_type = self.format.into();
        settings.mode = self.mode.into();
        settings.delay = Duration::from_millis(self.delay_ms);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cityweather").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);

        assert_eq!(cli.config, PathBuf::from("config/credentials.json"));
        assert_eq!(cli.preset, Preset::Metro);
        assert_eq!(cli.delay_ms, 1000);
        assert_eq!(cli.timeout(), Duration::from_secs(40));
        assert!(!cli.no_cache);

        let settings = cli.run_settings().unwrap();
        assert_eq!(settings.locations.len(), 10);
        assert_eq!(settings.range.days(), 1);
        assert_eq!(settings.content_type, ContentType::Json);
        assert_eq!(settings.mode, WriteMode::Upsert);
    }

    #[test]
    fn test_explicit_cities_and_range() {
        let cli = parse(&[
            "--city", "Pune,IN", "--city", "Goa,IN", "--start", "2025-10-05", "--end",
            "2025-10-06", "--format", "csv", "--mode", "replace", "--delay-ms", "0",
        ]);
        let settings = cli.run_settings().unwrap();

        let names: Vec<_> = settings.locations.iter().map(|l| l.name().to_string()).collect();
        assert_eq!(names, vec!["Pune,IN", "Goa,IN"]);
        assert_eq!(settings.range.to_string(), "2025-10-05 -> 2025-10-06");
        assert_eq!(settings.content_type, ContentType::Csv);
        assert_eq!(settings.mode, WriteMode::Replace);
        assert!(settings.delay.is_zero());
    }

    #[test]
    fn test_end_defaults_to_start() {
        let cli = parse(&["--start", "2025-09-01"]);
        let range = cli.date_range().unwrap();
        assert_eq!(range.start(), range.end());
    }

    #[test]
    fn test_end_requires_start() {
        let args = ["cityweather", "--end", "2025-09-30"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_tourist_preset() {
        let cli = parse(&["--preset", "tourist"]);
        assert_eq!(cli.locations().unwrap().len(), 27);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let cli = parse(&["--start", "2025-10-06", "--end", "2025-10-05"]);
        assert!(matches!(cli.run_settings(), Err(AppError::DateRange(_))));
    }
}
