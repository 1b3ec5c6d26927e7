use super::error::ResultParseError;
use super::{floats, read_text};
use crate::core::io::driver::HydrogenOverrides;
use std::path::Path;

const FILE: &str = "driver echo";
const LINES: usize = 8;

/// The driver file of an archived run, read back field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct InfileEcho {
    /// Display text: `inputs.rt` followed by the raw file without its final
    /// character.
    pub info: String,
    pub line_label: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub day_of_year: i32,
    /// Two-digit year as written in the file.
    pub year: i32,
    pub hour: f64,
    pub ap_flag: i32,
    /// Average Ap followed by the 3-hour values.
    pub ap: Vec<f64>,
    pub f107_daily: f64,
    pub f107_average: f64,
    pub msis_flag: i32,
    pub hydrogen: HydrogenOverrides,
    pub igeo_flag: i32,
    pub satellite_temperature: f64,
    pub satellite_density: f64,
}

fn tokens<'a>(
    lines: &[&'a str],
    index: usize,
    min: usize,
    expected: &'static str,
) -> Result<Vec<&'a str>, ResultParseError> {
    let text = lines[index];
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < min {
        return Err(ResultParseError::invalid(FILE, index + 1, expected, text));
    }
    Ok(tokens)
}

fn int(token: &str, line: usize, expected: &'static str) -> Result<i32, ResultParseError> {
    token
        .parse()
        .map_err(|_| ResultParseError::invalid(FILE, line, expected, token))
}

fn float(token: &str, line: usize, expected: &'static str) -> Result<f64, ResultParseError> {
    token
        .parse()
        .map_err(|_| ResultParseError::invalid(FILE, line, expected, token))
}

impl InfileEcho {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ResultParseError> {
        Self::parse(&read_text(path.as_ref())?)
    }

    pub fn parse(text: &str) -> Result<Self, ResultParseError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < LINES {
            return Err(ResultParseError::TooShort {
                file: FILE,
                expected: LINES,
                found: lines.len(),
            });
        }

        let mut raw = text.to_string();
        raw.pop();
        let info = format!("inputs.rt\n{raw}");

        let label = tokens(&lines, 0, 1, "a line label")?;
        let line_label = int(label[0], 1, "an integer line label")?;

        let loc = tokens(&lines, 1, 2, "latitude and longitude")?;
        let latitude = float(loc[0], 2, "a latitude")?;
        let longitude = float(loc[1], 2, "a longitude")?;

        let date = tokens(&lines, 2, 2, "day of year and year")?;
        let day_of_year = float(date[0], 3, "a day of year")? as i32;
        let year = float(date[1], 3, "a two-digit year")? as i32;

        let hour = float(tokens(&lines, 3, 1, "a decimal hour")?[0], 4, "a decimal hour")?;

        let ap_values = floats(FILE, 5, "numeric Ap values", lines[4])?;
        let (ap_flag, ap) = match ap_values.split_first() {
            Some((flag, rest)) => (*flag as i32, rest.to_vec()),
            None => return Err(ResultParseError::invalid(FILE, 5, "an Ap flag", lines[4])),
        };

        let flux = tokens(&lines, 5, 2, "daily and averaged f10.7")?;
        let f107_daily = float(flux[0], 6, "a daily f10.7")?;
        let f107_average = float(flux[1], 6, "an averaged f10.7")?;

        let h = tokens(&lines, 6, 4, "MSIS flag and three hydrogen parameters")?;
        let msis_flag = int(h[0], 7, "an integer MSIS flag")?;
        let hydrogen = HydrogenOverrides {
            exobase_density: float(h[1], 7, "an exobase density")?,
            vertical_flux: float(h[2], 7, "a vertical flux")?,
            mesopause_peak_density: float(h[3], 7, "a peak density")?,
        };

        let sat = tokens(&lines, 7, 3, "IGEO flag and satellite parameters")?;
        let igeo_flag = int(sat[0], 8, "an integer IGEO flag")?;
        let satellite_temperature = float(sat[1], 8, "a satellite temperature")?;
        let satellite_density = float(sat[2], 8, "a satellite density")?;

        Ok(Self {
            info,
            line_label,
            latitude,
            longitude,
            day_of_year,
            year,
            hour,
            ap_flag,
            ap,
            f107_daily,
            f107_average,
            msis_flag,
            hydrogen,
            igeo_flag,
            satellite_temperature,
            satellite_density,
        })
    }
}
