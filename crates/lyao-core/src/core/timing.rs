use super::calendar::{CalendarError, CalendarTable, ClockTime};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimingError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("Hour {hour} is outside 0-23 (UTC offset {utc_offset})")]
    InvalidHour { hour: i64, utc_offset: i32 },
    #[error("Date after {0} is outside the supported range")]
    DateOutOfRange(NaiveDate),
}

/// A UTC instant rendered the way the shadow executable reads it:
/// `YYYY MM DD HH MM SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShadowTime(pub NaiveDateTime);

impl ShadowTime {
    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// Whitespace-separated fields, one command-line argument each.
    pub fn to_args(&self) -> Vec<String> {
        self.to_string()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

impl fmt::Display for ShadowTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y %m %d %H %M %S"))
    }
}

impl From<NaiveDateTime> for ShadowTime {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

/// Where the AM and PM boundaries come from.
#[derive(Debug, Clone, Copy)]
pub enum TwilightSource<'a> {
    /// Per-day times from a sunrise/sunset table.
    Calendar(&'a CalendarTable),
    /// Fixed local hours, shifted by the UTC offset. Used for sites without a
    /// calendar table (CTIO runs use 09:00 and 15:00).
    FixedHours { am_hour: u32, pm_hour: u32 },
}

impl TwilightSource<'_> {
    pub const CTIO_AM_HOUR: u32 = 9;
    pub const CTIO_PM_HOUR: u32 = 15;

    fn times_for(
        &self,
        date: NaiveDate,
        utc_offset: i32,
    ) -> Result<(ClockTime, ClockTime), TimingError> {
        match self {
            TwilightSource::Calendar(table) => {
                let times = table.lookup(date)?;
                Ok((times.am, times.pm))
            }
            TwilightSource::FixedHours { am_hour, pm_hour } => Ok((
                ClockTime::new(shift_hour(*am_hour, utc_offset)?, 0),
                ClockTime::new(shift_hour(*pm_hour, utc_offset)?, 0),
            )),
        }
    }
}

/// The three boundaries of one observing night, all in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub am: ShadowTime,
    pub pm: ShadowTime,
    pub midnight: ShadowTime,
}

fn shift_hour(hour: u32, utc_offset: i32) -> Result<u32, TimingError> {
    checked_hour(i64::from(hour) + i64::from(utc_offset), utc_offset)
}

fn checked_hour(hour: i64, utc_offset: i32) -> Result<u32, TimingError> {
    if (0..=23).contains(&hour) {
        Ok(hour as u32)
    } else {
        Err(TimingError::InvalidHour { hour, utc_offset })
    }
}

fn at(date: NaiveDate, time: ClockTime, utc_offset: i32) -> Result<ShadowTime, TimingError> {
    let clock = NaiveTime::from_hms_opt(time.hour, time.minute, 0).ok_or(
        TimingError::InvalidHour {
            hour: i64::from(time.hour),
            utc_offset,
        },
    )?;
    Ok(ShadowTime(date.and_time(clock)))
}

/// Advances one day by ordinal, rolling day 366 (or 365 outside leap years)
/// over to January 1 of the next year.
pub fn next_day(date: NaiveDate) -> Result<NaiveDate, TimingError> {
    let days_in_year = if NaiveDate::from_yo_opt(date.year(), 366).is_some() {
        366
    } else {
        365
    };
    let (year, ordinal) = if date.ordinal() + 1 > days_in_year {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.ordinal() + 1)
    };
    NaiveDate::from_yo_opt(year, ordinal).ok_or(TimingError::DateOutOfRange(date))
}

/// Computes the dawn, dusk and midnight boundaries for `date`.
///
/// The PM boundary always falls on `date`. When the PM hour is later than the
/// same-day AM hour, the morning event belongs to the next calendar day, so
/// the AM boundary (and midnight) are taken from `date + 1`. Midnight is local
/// midnight expressed in UTC, i.e. hour `utc_offset`.
pub fn resolve_window(
    date: NaiveDate,
    utc_offset: i32,
    source: &TwilightSource<'_>,
) -> Result<TimeWindow, TimingError> {
    let (naive_am, pm) = source.times_for(date, utc_offset)?;

    let am_date = if pm.hour > naive_am.hour {
        next_day(date)?
    } else {
        date
    };
    let (am, _) = source.times_for(am_date, utc_offset)?;
    let midnight_hour = checked_hour(i64::from(utc_offset), utc_offset)?;

    Ok(TimeWindow {
        am: at(am_date, am, utc_offset)?,
        pm: at(date, pm, utc_offset)?,
        midnight: at(am_date, ClockTime::new(midnight_hour, 0), utc_offset)?,
    })
}
