use super::format::exponential;
use super::traits::InputFile;
use crate::core::site::{Location, SiteError};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::io::{self, Write};

pub const DRIVER_FILE: &str = "infile.dat";

/// Sentinel the transport model reads as "use the model's own value".
pub const UNSET: f64 = -1.0;

/// Hydrogen profile overrides on driver line 7.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydrogenOverrides {
    pub exobase_density: f64,
    pub vertical_flux: f64,
    pub mesopause_peak_density: f64,
}

impl Default for HydrogenOverrides {
    fn default() -> Self {
        Self {
            exobase_density: UNSET,
            vertical_flux: UNSET,
            mesopause_peak_density: UNSET,
        }
    }
}

/// Driver settings that stay fixed across a sweep. Defaults select the
/// MSIS/Chamberlain evaporative case for Lyman-beta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverDefaults {
    pub line_label: i32,
    pub msis_flag: i32,
    pub hydrogen: HydrogenOverrides,
    /// Extended (IGEO) exosphere flag.
    pub igeo_flag: i32,
    pub satellite_temperature: i32,
    pub satellite_density: f64,
}

impl Default for DriverDefaults {
    fn default() -> Self {
        Self {
            line_label: 2,
            msis_flag: -1,
            hydrogen: HydrogenOverrides::default(),
            igeo_flag: 1,
            satellite_temperature: 1000,
            satellite_density: UNSET,
        }
    }
}

/// Everything the transport executable needs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    pub latitude: f64,
    pub longitude: f64,
    /// Observation time, UT.
    pub time: NaiveDateTime,
    /// f10.7 solar flux. Written as both the daily and the 81-day value.
    pub f107: f64,
    pub ap: f64,
    pub defaults: DriverDefaults,
}

impl RunParameters {
    pub fn new(
        location: &Location,
        time: NaiveDateTime,
        f107: f64,
        ap: f64,
    ) -> Result<Self, SiteError> {
        let (latitude, longitude) = location.driver_coordinates()?;
        Ok(Self {
            latitude,
            longitude,
            time,
            f107,
            ap,
            defaults: DriverDefaults::default(),
        })
    }

    pub fn with_defaults(mut self, defaults: DriverDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Hour of day as a decimal, including minutes and seconds.
    pub fn decimal_hour(&self) -> f64 {
        let t = self.time.time();
        f64::from(t.hour()) + f64::from(t.minute()) / 60.0 + f64::from(t.second()) / 3600.0
    }
}

impl InputFile for RunParameters {
    const FILE_NAME: &'static str = DRIVER_FILE;

    fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
        let d = &self.defaults;
        writeln!(writer, "{}", d.line_label)?;
        writeln!(writer, "{:.4} {:.4}", self.latitude, self.longitude)?;
        writeln!(
            writer,
            "{} {:02}",
            self.time.ordinal(),
            self.time.year().rem_euclid(100)
        )?;
        writeln!(writer, "{:.2}", self.decimal_hour())?;
        writeln!(writer, "0 {:.1} 0.0 0.0 0.0 0.0 0.0 0.0", self.ap)?;
        writeln!(writer, "{:.1} {:.1}", self.f107, self.f107)?;
        writeln!(
            writer,
            "{}  {}  {}  {}",
            d.msis_flag,
            exponential(d.hydrogen.exobase_density, 1),
            exponential(d.hydrogen.vertical_flux, 1),
            exponential(d.hydrogen.mesopause_peak_density, 1)
        )?;
        writeln!(
            writer,
            "{}  {}  {}",
            d.igeo_flag,
            d.satellite_temperature,
            exponential(d.satellite_density, 1)
        )?;
        Ok(())
    }
}
