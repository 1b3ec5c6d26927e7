use super::error::ResultParseError;
use super::{floats, read_text};
use std::path::Path;

const FILE: &str = "source file";

/// Radius the transport model measures altitudes from, cm.
pub const EARTH_RADIUS_CM: f64 = 637_100_000.0;
const CM_PER_KM: f64 = 1e5;

const MSIS: &str = "MSIS";
const EXOSPHERE: &str = "EXOSPHERE & OPTICAL QUANTITIES";
const COLUMN_DENSITIES: &str = "COLUMN DENSITIES";
const CENTROID_RADII: &str = "NOMINAL CENTROID RADII";
const HYDROGEN_DENSITIES: &str = "HYDROGEN DENSITIES";
const OXYGEN_DENSITIES: &str = "MOLECULAR OXYGEN DENSITIES";
const TEMPERATURES: &str = "TEMPERATURES";

/// Each labelled section and the number of lines that follow its header.
const SECTIONS: [(&str, usize); 6] = [
    (EXOSPHERE, 0),
    (COLUMN_DENSITIES, 1),
    (CENTROID_RADII, ZONE_LINES),
    (HYDROGEN_DENSITIES, ZONE_LINES),
    (OXYGEN_DENSITIES, ZONE_LINES),
    (TEMPERATURES, ZONE_LINES),
];
const ZONE_LINES: usize = 3;

/// One row of the MSIS grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MsisLevel {
    /// Altitude above the surface, km.
    pub altitude: f64,
    pub radius: f64,
    pub temperature: f64,
    pub hydrogen: f64,
    pub oxygen: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnDensities {
    pub hydrogen: f64,
    pub oxygen: f64,
    /// H plus O2 with the opacity scaling applied.
    pub total: f64,
    pub above_exobase: f64,
}

/// One zone of the extended (IGEO) profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneSample {
    /// Altitude above the surface, km, converted from the centroid radius.
    pub altitude: f64,
    pub hydrogen: f64,
    pub oxygen: f64,
    pub temperature: f64,
}

/// The `H_alpha.source` file: MSIS inputs and grid, column densities and
/// the zone-by-zone density and temperature profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceProfile {
    /// Raw MSIS inputs: lat, lon, DOY, year, UT, STL, Ap, f10.7.
    pub msis_inputs: Vec<String>,
    pub msis: Vec<MsisLevel>,
    pub column: ColumnDensities,
    pub zones: Vec<ZoneSample>,
}

pub fn radius_to_altitude(radius_cm: f64) -> f64 {
    (radius_cm - EARTH_RADIUS_CM) / CM_PER_KM
}

impl SourceProfile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ResultParseError> {
        Self::parse(&read_text(path.as_ref())?)
    }

    pub fn parse(text: &str) -> Result<Self, ResultParseError> {
        let lines: Vec<&str> = text.lines().collect();
        let inputs_line = lines.get(1).ok_or(ResultParseError::TooShort {
            file: FILE,
            expected: 2,
            found: lines.len(),
        })?;
        let msis_inputs = inputs_line
            .split_whitespace()
            .take(8)
            .map(str::to_string)
            .collect();

        let headers = locate_sections(&lines)?;
        let [exo, cd, radii, h, o2, t] = headers;

        let msis_header = lines[..exo]
            .iter()
            .rposition(|l| l.contains(MSIS))
            .ok_or(ResultParseError::MissingSection {
                file: FILE,
                header: MSIS,
            })?;
        let msis = parse_msis_grid(&lines, msis_header + 2, exo)?;

        let cd_values = floats(FILE, cd + 2, "four column densities", lines[cd + 1])?;
        let column = match cd_values.as_slice() {
            [hydrogen, oxygen, total, above_exobase, ..] => ColumnDensities {
                hydrogen: *hydrogen,
                oxygen: *oxygen,
                total: *total,
                above_exobase: *above_exobase,
            },
            _ => {
                return Err(ResultParseError::invalid(
                    FILE,
                    cd + 2,
                    "four column densities",
                    lines[cd + 1],
                ));
            }
        };

        let radii = zone_block(&lines, radii, "centroid radii")?;
        let hydrogen = zone_block(&lines, h, "hydrogen densities")?;
        let oxygen = zone_block(&lines, o2, "O2 densities")?;
        let temperature = zone_block(&lines, t, "temperatures")?;
        if ![hydrogen.len(), oxygen.len(), temperature.len()]
            .iter()
            .all(|&n| n == radii.len())
        {
            return Err(ResultParseError::ZoneLengthMismatch {
                file: FILE,
                altitudes: radii.len(),
                hydrogen: hydrogen.len(),
                oxygen: oxygen.len(),
                temperature: temperature.len(),
            });
        }
        let zones = radii
            .iter()
            .zip(&hydrogen)
            .zip(&oxygen)
            .zip(&temperature)
            .map(|(((r, h), o), t)| ZoneSample {
                altitude: radius_to_altitude(*r),
                hydrogen: *h,
                oxygen: *o,
                temperature: *t,
            })
            .collect();

        Ok(Self {
            msis_inputs,
            msis,
            column,
            zones,
        })
    }
}

/// Finds the header line of every labelled section. Each must appear exactly
/// once and be followed by its full block.
fn locate_sections(lines: &[&str]) -> Result<[usize; 6], ResultParseError> {
    let mut found: [Option<usize>; 6] = [None; 6];
    for (idx, line) in lines.iter().enumerate() {
        for (slot, &(header, _)) in found.iter_mut().zip(SECTIONS.iter()) {
            if !line.contains(header) {
                continue;
            }
            if slot.is_some() {
                return Err(ResultParseError::DuplicateSection {
                    file: FILE,
                    line: idx + 1,
                    header,
                });
            }
            *slot = Some(idx);
        }
    }

    let mut positions = [0; 6];
    for ((pos, slot), (header, needed)) in positions.iter_mut().zip(found).zip(SECTIONS) {
        let idx = slot.ok_or(ResultParseError::MissingSection {
            file: FILE,
            header,
        })?;
        let available = lines.len() - idx - 1;
        if available < needed {
            return Err(ResultParseError::TruncatedSection {
                file: FILE,
                header,
                expected: needed,
                found: available,
            });
        }
        *pos = idx;
    }
    Ok(positions)
}

fn parse_msis_grid(
    lines: &[&str],
    start: usize,
    end: usize,
) -> Result<Vec<MsisLevel>, ResultParseError> {
    let mut grid = Vec::new();
    for (offset, line) in lines.get(start..end).unwrap_or(&[]).iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let number = start + offset + 1;
        let row = floats(FILE, number, "an MSIS grid row", line)?;
        match row.as_slice() {
            [altitude, radius, temperature, hydrogen, oxygen, ..] => grid.push(MsisLevel {
                altitude: *altitude,
                radius: *radius,
                temperature: *temperature,
                hydrogen: *hydrogen,
                oxygen: *oxygen,
            }),
            _ => {
                return Err(ResultParseError::invalid(
                    FILE,
                    number,
                    "at least five MSIS grid columns",
                    line,
                ));
            }
        }
    }
    Ok(grid)
}

fn zone_block(
    lines: &[&str],
    header: usize,
    expected: &'static str,
) -> Result<Vec<f64>, ResultParseError> {
    let mut values = Vec::new();
    for idx in header + 1..=header + ZONE_LINES {
        values.extend(floats(FILE, idx + 1, expected, lines[idx])?);
    }
    Ok(values)
}
