use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HEADER_LINES: usize = 9;
pub const FOOTER_LINES: usize = 3;
pub const DAY_LABEL_WIDTH: usize = 2;
pub const COLUMN_WIDTH: usize = 11;

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Failed to read calendar '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Calendar has {lines} lines, fewer than the 9 header and 3 footer lines")]
    TooShort { lines: usize },
    #[error("Line {line}: row contains non-ASCII text")]
    NonAscii { line: usize },
    #[error("Line {line}: invalid day label '{value}'")]
    InvalidDayLabel { line: usize, value: String },
    #[error("Line {line}: day {day} appears more than once")]
    DuplicateDay { line: usize, day: u32 },
    #[error("Line {line}: {columns} month columns found, at most 12 expected")]
    TooManyColumns { line: usize, columns: usize },
    #[error("Line {line}, {month}: expected an AM and a PM time, found '{value}'")]
    MalformedCell {
        line: usize,
        month: &'static str,
        value: String,
    },
    #[error("Line {line}, {month}: '{value}' is not a valid HHMM time")]
    InvalidTime {
        line: usize,
        month: &'static str,
        value: String,
    },
    #[error("No calendar entry for day {day:02} of {month}")]
    MissingEntry { day: u32, month: &'static str },
}

/// Hour and minute of a calendar event, parsed from an `HHMM` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    /// Parses a four-digit `HHMM` token. Returns `None` for anything else,
    /// including hours above 23 and minutes above 59.
    pub fn parse_hhmm(token: &str) -> Option<Self> {
        if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hour: u32 = token[0..2].parse().ok()?;
        let minute: u32 = token[2..4].parse().ok()?;
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.hour, self.minute)
    }
}

/// Morning and evening event times for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwilightTimes {
    pub am: ClockTime,
    pub pm: ClockTime,
}

/// A sunrise/sunset (or twilight) table keyed by day of month and month.
///
/// The source layout is a fixed-width text table: nine header lines, three
/// footer lines, and one row per day of month. Each row starts with a
/// two-character day label followed by twelve 11-character month columns,
/// each holding an AM and a PM `HHMM` token. Columns that are blank (for
/// example February 30) produce no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarTable {
    entries: BTreeMap<(u32, u32), TwilightTimes>,
}

impl CalendarTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CalendarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, CalendarError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < HEADER_LINES + FOOTER_LINES {
            return Err(CalendarError::TooShort { lines: lines.len() });
        }

        let mut entries = BTreeMap::new();
        let mut seen_days = Vec::new();
        for (offset, raw) in lines[HEADER_LINES..lines.len() - FOOTER_LINES]
            .iter()
            .enumerate()
        {
            let line = HEADER_LINES + offset + 1;
            let row = raw.trim_end_matches('\r');
            if row.trim().is_empty() {
                continue;
            }
            if !row.is_ascii() {
                return Err(CalendarError::NonAscii { line });
            }

            let label = row.get(..DAY_LABEL_WIDTH).unwrap_or(row).trim();
            let day: u32 = label
                .parse()
                .ok()
                .filter(|d| (1..=31).contains(d))
                .ok_or_else(|| CalendarError::InvalidDayLabel {
                    line,
                    value: label.to_string(),
                })?;
            if seen_days.contains(&day) {
                return Err(CalendarError::DuplicateDay { line, day });
            }
            seen_days.push(day);

            let body = row.get(DAY_LABEL_WIDTH..).unwrap_or("");
            let columns: Vec<&str> = body
                .as_bytes()
                .chunks(COLUMN_WIDTH)
                .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
                .collect();
            if columns.len() > MONTH_ABBREVIATIONS.len() {
                return Err(CalendarError::TooManyColumns {
                    line,
                    columns: columns.len(),
                });
            }

            for (month_idx, cell) in columns.iter().enumerate() {
                let month = MONTH_ABBREVIATIONS[month_idx];
                let tokens: Vec<&str> = cell.split_whitespace().collect();
                match tokens.as_slice() {
                    [] => continue,
                    [am, pm] => {
                        let parse = |token: &str| {
                            ClockTime::parse_hhmm(token).ok_or_else(|| {
                                CalendarError::InvalidTime {
                                    line,
                                    month,
                                    value: token.to_string(),
                                }
                            })
                        };
                        let times = TwilightTimes {
                            am: parse(*am)?,
                            pm: parse(*pm)?,
                        };
                        entries.insert((day, month_idx as u32 + 1), times);
                    }
                    _ => {
                        return Err(CalendarError::MalformedCell {
                            line,
                            month,
                            value: cell.trim().to_string(),
                        });
                    }
                }
            }
        }

        Ok(Self { entries })
    }

    /// Looks up the entry for `day` (1-31) of `month` (1-12).
    pub fn get(&self, day: u32, month: u32) -> Option<&TwilightTimes> {
        self.entries.get(&(day, month))
    }

    pub fn lookup(&self, date: NaiveDate) -> Result<&TwilightTimes, CalendarError> {
        self.get(date.day(), date.month())
            .ok_or(CalendarError::MissingEntry {
                day: date.day(),
                month: MONTH_ABBREVIATIONS[date.month0() as usize],
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `((day, month), times)` in month-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), &TwilightTimes)> {
        self.entries.iter().map(|(&key, times)| (key, times))
    }
}
