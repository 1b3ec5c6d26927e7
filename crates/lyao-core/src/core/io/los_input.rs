use super::format::exponential;
use super::traits::InputFile;
use crate::core::geometry::GeometryRecord;
use std::io::{self, Write};

pub const LOS_INPUT_FILE: &str = "inputs_los.dat";

/// Fixed spectroscopic constants written on the first line of the
/// line-of-sight input file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LosHeader {
    pub line_label: i32,
    /// Resonance wavelength, Angstrom.
    pub wavelength: f64,
    pub branching_ratio: f64,
    /// Solar line-center flux, photons cm^-2 s^-1 A^-1.
    pub line_center_flux: f64,
}

impl LosHeader {
    pub const LYMAN_BETA: LosHeader = LosHeader {
        line_label: 2,
        wavelength: 1025.72,
        branching_ratio: 0.882,
        line_center_flux: 1e9,
    };
}

impl Default for LosHeader {
    fn default() -> Self {
        Self::LYMAN_BETA
    }
}

/// The `inputs_los.dat` file: one row of viewing geometry per shadow sample.
#[derive(Debug, Clone, Copy)]
pub struct LosInput<'a> {
    pub records: &'a [GeometryRecord],
    pub header: LosHeader,
}

impl<'a> LosInput<'a> {
    pub fn new(records: &'a [GeometryRecord], header: LosHeader) -> Self {
        Self { records, header }
    }
}

impl InputFile for LosInput<'_> {
    const FILE_NAME: &'static str = LOS_INPUT_FILE;

    fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
        let h = &self.header;
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            self.records.len(),
            h.line_label,
            exponential(h.wavelength, 3),
            exponential(h.branching_ratio, 3),
            exponential(h.line_center_flux, 4),
        )?;
        for r in self.records {
            writeln!(
                writer,
                "{:.1}    {:.1}    {:.1}    {:.3}",
                r.sun_zenith, r.target_zenith, r.diff_azimuth, r.shadow_altitude
            )?;
        }
        Ok(())
    }
}
