use super::shadow::{Pointing, ShadowExecutable};
use super::transport::TransportExecutable;
use crate::core::io::driver::DriverDefaults;
use crate::core::io::los_input::LosHeader;
use crate::core::site::Location;
use chrono::NaiveDate;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

/// Evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

pub const DEFAULT_F107_START: f64 = 50.0;
pub const DEFAULT_F107_STOP: f64 = 270.0;
pub const DEFAULT_F107_COUNT: usize = 12;
pub const DEFAULT_AP: f64 = 5.0;
pub const DEFAULT_STEP_MINUTES: u32 = 10;
pub const DEFAULT_AM_HOUR_UT: u32 = 11;
pub const DEFAULT_PM_HOUR_UT: u32 = 4;

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_yo_opt(year, 366).is_some() {
        366
    } else {
        365
    }
}

/// Days of year (inclusive) on which daylight time is in effect. On those
/// days the UTC offset is one hour smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DstRule {
    pub first_day: u32,
    pub last_day: u32,
}

impl DstRule {
    /// The US daylight-time span for 2000: April 2 to October 29.
    pub const US_2000: DstRule = DstRule {
        first_day: 93,
        last_day: 303,
    };

    pub fn contains(&self, day_of_year: u32) -> bool {
        (self.first_day..=self.last_day).contains(&day_of_year)
    }
}

/// Where dawn and dusk come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TwilightConfig {
    /// A fixed-width sunrise/sunset or twilight table.
    Calendar(PathBuf),
    /// Fixed local hours, for sites without a table.
    FixedHours { am_hour: u32, pm_hour: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    pub year: i32,
    pub days: RangeInclusive<u32>,
    /// Standard-time offset, hours to add to local time to get UTC.
    pub utc_offset: i32,
    pub dst: Option<DstRule>,
    pub twilight: TwilightConfig,
    pub step_minutes: u32,
    /// UT hours written to the driver file for the AM and PM runs.
    pub am_hour: u32,
    pub pm_hour: u32,
}

impl TimeGrid {
    pub fn utc_offset_on(&self, day_of_year: u32) -> i32 {
        match self.dst {
            Some(rule) if rule.contains(day_of_year) => self.utc_offset - 1,
            _ => self.utc_offset,
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days
            .clone()
            .filter_map(move |d| NaiveDate::from_yo_opt(self.year, d))
    }

    pub fn day_count(&self) -> u64 {
        self.dates().count() as u64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutablePaths {
    pub shadow: ShadowExecutable,
    pub transport: TransportExecutable,
    pub archive_root: PathBuf,
}

/// Everything a sweep needs. Built once and passed to the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub paths: ExecutablePaths,
    pub grid: TimeGrid,
    pub location: Location,
    pub pointing: Vec<Pointing>,
    pub f107: Vec<f64>,
    pub ap: f64,
    pub driver: DriverDefaults,
    pub los_header: LosHeader,
    /// Keep going after a failed run instead of stopping the sweep.
    pub continue_on_error: bool,
}

impl SweepConfig {
    pub fn total_runs(&self) -> u64 {
        self.grid.day_count() * self.f107.len() as u64 * 2
    }
}

#[derive(Default)]
pub struct SweepConfigBuilder {
    shadow_dir: Option<PathBuf>,
    shadow_program: Option<PathBuf>,
    transport_dir: Option<PathBuf>,
    transport_program: Option<PathBuf>,
    archive_root: Option<PathBuf>,
    year: Option<i32>,
    first_day: Option<u32>,
    last_day: Option<u32>,
    utc_offset: Option<i32>,
    dst: Option<DstRule>,
    twilight: Option<TwilightConfig>,
    step_minutes: Option<u32>,
    am_hour: Option<u32>,
    pm_hour: Option<u32>,
    location: Option<Location>,
    pointing: Vec<Pointing>,
    f107: Option<Vec<f64>>,
    ap: Option<f64>,
    driver: Option<DriverDefaults>,
    los_header: Option<LosHeader>,
    continue_on_error: Option<bool>,
}

impl SweepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shadow_dir(mut self, dir: PathBuf) -> Self {
        self.shadow_dir = Some(dir);
        self
    }
    pub fn shadow_program(mut self, program: PathBuf) -> Self {
        self.shadow_program = Some(program);
        self
    }
    pub fn transport_dir(mut self, dir: PathBuf) -> Self {
        self.transport_dir = Some(dir);
        self
    }
    pub fn transport_program(mut self, program: PathBuf) -> Self {
        self.transport_program = Some(program);
        self
    }
    pub fn archive_root(mut self, dir: PathBuf) -> Self {
        self.archive_root = Some(dir);
        self
    }
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
    pub fn first_day(mut self, day: u32) -> Self {
        self.first_day = Some(day);
        self
    }
    pub fn last_day(mut self, day: u32) -> Self {
        self.last_day = Some(day);
        self
    }
    pub fn utc_offset(mut self, hours: i32) -> Self {
        self.utc_offset = Some(hours);
        self
    }
    pub fn dst(mut self, rule: Option<DstRule>) -> Self {
        self.dst = rule;
        self
    }
    pub fn twilight(mut self, twilight: TwilightConfig) -> Self {
        self.twilight = Some(twilight);
        self
    }
    pub fn step_minutes(mut self, minutes: u32) -> Self {
        self.step_minutes = Some(minutes);
        self
    }
    pub fn observation_hours(mut self, am_hour: u32, pm_hour: u32) -> Self {
        self.am_hour = Some(am_hour);
        self.pm_hour = Some(pm_hour);
        self
    }
    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
    pub fn pointing(mut self, pointing: Vec<Pointing>) -> Self {
        self.pointing = pointing;
        self
    }
    pub fn f107(mut self, values: Vec<f64>) -> Self {
        self.f107 = Some(values);
        self
    }
    pub fn ap(mut self, ap: f64) -> Self {
        self.ap = Some(ap);
        self
    }
    pub fn driver(mut self, defaults: DriverDefaults) -> Self {
        self.driver = Some(defaults);
        self
    }
    pub fn los_header(mut self, header: LosHeader) -> Self {
        self.los_header = Some(header);
        self
    }
    pub fn continue_on_error(mut self, keep_going: bool) -> Self {
        self.continue_on_error = Some(keep_going);
        self
    }

    pub fn build(self) -> Result<SweepConfig, ConfigError> {
        let year = self.year.ok_or(ConfigError::MissingParameter("year"))?;
        let year_length = days_in_year(year);
        let first_day = self.first_day.unwrap_or(1);
        let last_day = self.last_day.unwrap_or(year_length);
        if first_day == 0 || first_day > last_day || last_day > year_length {
            return Err(invalid(
                "days",
                format!("{first_day}..={last_day} is not within 1..={year_length} for {year}"),
            ));
        }

        let step_minutes = self.step_minutes.unwrap_or(DEFAULT_STEP_MINUTES);
        if step_minutes == 0 {
            return Err(invalid("step_minutes", "must be at least 1"));
        }
        let am_hour = self.am_hour.unwrap_or(DEFAULT_AM_HOUR_UT);
        let pm_hour = self.pm_hour.unwrap_or(DEFAULT_PM_HOUR_UT);
        if am_hour > 23 || pm_hour > 23 {
            return Err(invalid(
                "observation_hours",
                format!("{am_hour} and {pm_hour} must both be in 0-23"),
            ));
        }
        if let Some(rule) = self.dst {
            if rule.first_day > rule.last_day {
                return Err(invalid("dst", "first day is after last day"));
            }
        }

        let f107 = self.f107.unwrap_or_else(|| {
            linspace(DEFAULT_F107_START, DEFAULT_F107_STOP, DEFAULT_F107_COUNT)
        });
        if f107.is_empty() {
            return Err(invalid("f107", "at least one flux value is required"));
        }
        if let Some(bad) = f107.iter().find(|f| !f.is_finite() || **f < 0.0) {
            return Err(invalid("f107", format!("{bad} is not a valid flux")));
        }

        let mut shadow = ShadowExecutable::new(
            self.shadow_dir
                .ok_or(ConfigError::MissingParameter("shadow_dir"))?,
        );
        if let Some(program) = self.shadow_program {
            shadow.program = program;
        }
        let mut transport = TransportExecutable::new(
            self.transport_dir
                .ok_or(ConfigError::MissingParameter("transport_dir"))?,
        );
        if let Some(program) = self.transport_program {
            transport.program = program;
        }

        let archive_root = self
            .archive_root
            .ok_or(ConfigError::MissingParameter("archive_root"))?;
        let utc_offset = self
            .utc_offset
            .ok_or(ConfigError::MissingParameter("utc_offset"))?;
        let twilight = self
            .twilight
            .ok_or(ConfigError::MissingParameter("twilight"))?;
        let location = self
            .location
            .ok_or(ConfigError::MissingParameter("location"))?;
        // The driver file needs numeric coordinates for every run.
        location
            .driver_coordinates()
            .map_err(|e| invalid("location", e.to_string()))?;

        Ok(SweepConfig {
            paths: ExecutablePaths {
                shadow,
                transport,
                archive_root,
            },
            grid: TimeGrid {
                year,
                days: first_day..=last_day,
                utc_offset,
                dst: self.dst,
                twilight,
                step_minutes,
                am_hour,
                pm_hour,
            },
            location,
            pointing: self.pointing,
            f107,
            ap: self.ap.unwrap_or(DEFAULT_AP),
            driver: self.driver.unwrap_or_default(),
            los_header: self.los_header.unwrap_or_default(),
            continue_on_error: self.continue_on_error.unwrap_or(true),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn minimal_builder() -> SweepConfigBuilder {
        SweepConfigBuilder::new()
            .shadow_dir(PathBuf::from("/opt/shadow"))
            .transport_dir(PathBuf::from("/opt/lyao"))
            .archive_root(PathBuf::from("/data/out"))
            .year(2000)
            .utc_offset(6)
            .twilight(TwilightConfig::FixedHours {
                am_hour: 9,
                pm_hour: 15,
            })
            .location(Location::preset("pbo").unwrap())
    }

    #[test]
    fn build_applies_defaults() {
        let config = minimal_builder().build().unwrap();
        assert_eq!(config.grid.days, 1..=366);
        assert_eq!(config.grid.step_minutes, 10);
        assert_eq!((config.grid.am_hour, config.grid.pm_hour), (11, 4));
        assert_eq!(config.f107.len(), 12);
        assert_eq!(config.f107[1], 70.0);
        assert_eq!(config.ap, 5.0);
        assert_eq!(config.driver, DriverDefaults::default());
        assert_eq!(config.paths.shadow.program, PathBuf::from("shadow"));
        assert_eq!(config.paths.transport.program, PathBuf::from("testscript"));
        assert!(config.continue_on_error);
        assert_eq!(config.total_runs(), 366 * 12 * 2);
    }

    #[test]
    fn build_fails_on_missing_parameter() {
        let result = SweepConfigBuilder::new().year(2000).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("shadow_dir")));
    }

    #[test]
    fn build_rejects_day_beyond_year_end() {
        let result = minimal_builder().year(2001).last_day(366).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "days", .. })
        ));
    }

    #[test]
    fn build_rejects_empty_flux_grid() {
        let result = minimal_builder().f107(Vec::new()).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "f107", .. })
        ));
    }

    #[test]
    fn build_rejects_site_without_driver_coordinates() {
        let result = minimal_builder()
            .location(Location::preset("erau").unwrap())
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "location", .. })
        ));
    }

    #[test]
    fn build_keeps_pointing_pairs_in_order() {
        let pairs = vec![
            Pointing::RaDec { ra: 5.5, dec: -12.0 },
            Pointing::AzEl { az: 180.0, el: 45.0 },
        ];
        let config = minimal_builder().pointing(pairs.clone()).build().unwrap();
        assert_eq!(config.pointing, pairs);
        assert!(minimal_builder().build().unwrap().pointing.is_empty());
    }

    #[test]
    fn linspace_includes_both_ends() {
        let values = linspace(50.0, 270.0, 12);
        assert_eq!(values.first(), Some(&50.0));
        assert_eq!(values.last(), Some(&270.0));
        assert_eq!(values[3], 110.0);
        assert_eq!(linspace(70.0, 90.0, 1), vec![70.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn dst_days_use_the_smaller_offset() {
        let config = minimal_builder().dst(Some(DstRule::US_2000)).build().unwrap();
        assert_eq!(config.grid.utc_offset_on(92), 6);
        assert_eq!(config.grid.utc_offset_on(93), 5);
        assert_eq!(config.grid.utc_offset_on(303), 5);
        assert_eq!(config.grid.utc_offset_on(304), 6);
    }

    #[test]
    fn dates_cover_the_configured_days() {
        let config = minimal_builder().first_day(365).build().unwrap();
        let dates: Vec<NaiveDate> = config.grid.dates().collect();
        assert_eq!(
            dates,
            [
                NaiveDate::from_ymd_opt(2000, 12, 30).unwrap(),
                NaiveDate::from_ymd_opt(2000, 12, 31).unwrap()
            ]
        );
    }
}
