use super::error::ResultParseError;
use super::read_text;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

const FILE: &str = "line-of-sight file";
const ALTITUDE_FIELD: usize = 3;
const INTENSITY_FIELD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LosSample {
    /// Shadow altitude, km, rounded to six decimals.
    #[serde(rename = "shadow_altitude_km")]
    pub altitude: f64,
    /// Emission intensity, Rayleigh.
    #[serde(rename = "intensity_r")]
    pub intensity: f64,
}

/// Line-of-sight intensities ordered by ascending shadow altitude.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LosSeries {
    samples: Vec<LosSample>,
}

/// Rounds through the decimal formatter so ties land on the printed digit.
fn round6(value: f64) -> f64 {
    format!("{value:.6}").parse().unwrap_or(value)
}

impl LosSeries {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ResultParseError> {
        Self::parse(&read_text(path.as_ref())?)
    }

    pub fn parse(text: &str) -> Result<Self, ResultParseError> {
        let mut samples = Vec::new();
        for (idx, line) in text.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let field = |i: usize, expected: &'static str| {
                fields
                    .get(i)
                    .and_then(|t| t.parse::<f64>().ok())
                    .ok_or_else(|| ResultParseError::invalid(FILE, idx + 1, expected, line))
            };
            samples.push(LosSample {
                altitude: round6(field(ALTITUDE_FIELD, "a shadow altitude in column 4")?),
                intensity: field(INTENSITY_FIELD, "an intensity in column 5")?,
            });
        }
        Ok(Self::from_samples(samples))
    }

    /// Sorts by altitude. Ties keep their input order.
    pub fn from_samples(mut samples: Vec<LosSample>) -> Self {
        samples.sort_by(|a, b| a.altitude.total_cmp(&b.altitude));
        Self { samples }
    }

    pub fn samples(&self) -> &[LosSample] {
        &self.samples
    }

    pub fn altitudes(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.altitude)
    }

    pub fn intensities(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.intensity)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Writes the series as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut w = csv::Writer::from_writer(writer);
        for sample in &self.samples {
            w.serialize(sample)?;
        }
        w.flush()?;
        Ok(())
    }
}
