use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Literal text that opens every shadow output line.
const LINE_PREFIX: &str = "ra/dec";

/// One observation instant as reported by the shadow executable.
///
/// Sexagesimal triples are collapsed into decimal hours or degrees with
/// [`sexagesimal_to_decimal`]. The UTC stamp is kept exactly as printed.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    /// Right ascension, decimal hours.
    pub ra: f64,
    /// Declination, decimal degrees.
    pub dec: f64,
    /// Distance to the Earth's shadow along the line of sight, km.
    pub shadow_distance: f64,
    /// Altitude of the shadow boundary along the line of sight, km.
    pub shadow_altitude: f64,
    pub target_azimuth: f64,
    pub target_zenith: f64,
    pub sun_azimuth: f64,
    pub sun_zenith: f64,
    /// Azimuth difference between target and sun, degrees.
    pub diff_azimuth: f64,
    pub utc: String,
    /// Local apparent sidereal time, decimal hours.
    pub last: f64,
    /// Velocity relative to the local standard of rest, km/s.
    pub vlsr: f64,
    pub galactic_longitude: f64,
    pub galactic_latitude: f64,
    pub hour_angle: f64,
}

#[derive(Debug, Error)]
pub enum GeometryParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Line {line}: expected line to start with 'ra/dec', found '{found}'")]
    MissingPrefix { line: usize, found: String },
    #[error("Line {line}: expected '{expected}' after field '{field}', found '{found}'")]
    MissingDelimiter {
        line: usize,
        field: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("Line {line}: field '{field}' is empty")]
    EmptyField { line: usize, field: &'static str },
    #[error("Line {line}: field '{field}' is not a number (value: '{value}')")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Collapses a degree/minute/second (or hour/minute/second) triple.
///
/// The sign of `d` is not carried into `m` and `s`; this mirrors how the
/// shadow output has always been reduced.
pub fn sexagesimal_to_decimal(d: f64, m: f64, s: f64) -> f64 {
    d + m / 60.0 + s / 3600.0
}

struct FieldScanner<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> FieldScanner<'a> {
    fn text(
        &mut self,
        field: &'static str,
        delimiter: &'static str,
    ) -> Result<&'a str, GeometryParseError> {
        let idx = self
            .rest
            .find(delimiter)
            .ok_or_else(|| GeometryParseError::MissingDelimiter {
                line: self.line,
                field,
                expected: delimiter,
                found: self.rest.trim().to_string(),
            })?;
        let value = self.rest[..idx].trim();
        self.rest = &self.rest[idx + delimiter.len()..];
        if value.is_empty() {
            return Err(GeometryParseError::EmptyField {
                line: self.line,
                field,
            });
        }
        Ok(value)
    }

    fn number(
        &mut self,
        field: &'static str,
        delimiter: &'static str,
    ) -> Result<f64, GeometryParseError> {
        let value = self.text(field, delimiter)?;
        parse_number(value, field, self.line)
    }

    fn sexagesimal(
        &mut self,
        fields: [(&'static str, &'static str); 3],
    ) -> Result<f64, GeometryParseError> {
        let d = self.number(fields[0].0, fields[0].1)?;
        let m = self.number(fields[1].0, fields[1].1)?;
        let s = self.number(fields[2].0, fields[2].1)?;
        Ok(sexagesimal_to_decimal(d, m, s))
    }

    fn last_number(&mut self, field: &'static str) -> Result<f64, GeometryParseError> {
        let value = self.rest.trim();
        self.rest = "";
        if value.is_empty() {
            return Err(GeometryParseError::EmptyField {
                line: self.line,
                field,
            });
        }
        parse_number(value, field, self.line)
    }
}

fn parse_number(value: &str, field: &'static str, line: usize) -> Result<f64, GeometryParseError> {
    value.parse().map_err(|_| GeometryParseError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

/// Parses a single shadow output line. `line` is the 1-based line number used
/// in error messages.
///
/// Layout:
///
/// ```text
/// ra/dec {h}H {m}M {s}S {d}D {m}' {s}" shadow distance {km} km altitude {km} km
/// targ az {deg} zd {deg} sun az {deg} zd {deg} diff-az {deg} utc {stamp}
/// last {h}H {m}M {s}S vlsr {v} km/s l/b {h}H {m}M {s}S {d}D {m}' {s}" ha {ha}
/// ```
pub fn parse_line(text: &str, line: usize) -> Result<GeometryRecord, GeometryParseError> {
    let body = text.trim_end_matches(['\n', '\r']);
    let start = body
        .find(LINE_PREFIX)
        .ok_or_else(|| GeometryParseError::MissingPrefix {
            line,
            found: body.trim().to_string(),
        })?;
    let mut s = FieldScanner {
        rest: &body[start + LINE_PREFIX.len()..],
        line,
    };

    let ra = s.sexagesimal([("ra_h", "H"), ("ra_m", "M"), ("ra_s", "S")])?;
    let dec = s.sexagesimal([
        ("dec_d", "D"),
        ("dec_m", "'"),
        ("dec_s", "\" shadow distance"),
    ])?;
    let shadow_distance = s.number("shddist", "km altitude")?;
    let shadow_altitude = s.number("shdalt", "km targ az")?;
    let target_azimuth = s.number("targaz", "zd")?;
    let target_zenith = s.number("targzd", "sun az")?;
    let sun_azimuth = s.number("sunaz", "zd")?;
    let sun_zenith = s.number("sunzd", "diff-az")?;
    let diff_azimuth = s.number("diffaz", "utc")?;
    let utc = s.text("utc", "last")?.to_string();
    let last = s.sexagesimal([("last_h", "H"), ("last_m", "M"), ("last_s", "S vlsr")])?;
    let vlsr = s.number("vlsr", "km/s l/b")?;
    let galactic_longitude =
        s.sexagesimal([("glon_h", "H"), ("glon_m", "M"), ("glon_s", "S")])?;
    let galactic_latitude =
        s.sexagesimal([("glat_d", "D"), ("glat_m", "'"), ("glat_s", "\" ha")])?;
    let hour_angle = s.last_number("targha")?;

    Ok(GeometryRecord {
        ra,
        dec,
        shadow_distance,
        shadow_altitude,
        target_azimuth,
        target_zenith,
        sun_azimuth,
        sun_zenith,
        diff_azimuth,
        utc,
        last,
        vlsr,
        galactic_longitude,
        galactic_latitude,
        hour_angle,
    })
}

/// Parses every non-blank line of a shadow run, preserving order.
pub fn parse_output(text: &str) -> Result<Vec<GeometryRecord>, GeometryParseError> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(idx, l)| parse_line(l, idx + 1))
        .collect()
}

pub fn read_output<P: AsRef<Path>>(path: P) -> Result<Vec<GeometryRecord>, GeometryParseError> {
    let text = fs::read_to_string(path)?;
    parse_output(&text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_LINE: &str = "ra/dec 1H 30M 0S 20D 15' 36\" shadow distance 1234.5 km altitude 567.8 km targ az 180.0 zd 45.0 sun az 90.0 zd 110.0 diff-az 90.0 utc 2000 01 01 06 00 00.000 last 12H 0M 0S vlsr -5.2 km/s l/b 3H 0M 0S -10D 30' 0\" ha -1.25\n";

    pub(crate) fn sample_line(shadow_altitude: f64, utc: &str) -> String {
        format!(
            "ra/dec  2H 15M 36.00S  40D  6' 18.0\" shadow distance  2500.1 km altitude {shadow_altitude:.3} km targ az  12.5 zd  35.0 sun az 250.0 zd 105.2 diff-az 122.5 utc {utc} last  5H 40M 12.5S vlsr  10.0 km/s l/b  8H 10M  0.0S  15D 45' 36.0\" ha 3.5\n"
        )
    }

    #[test]
    fn parse_line_collapses_right_ascension() {
        let record = parse_line(SAMPLE_LINE, 1).unwrap();
        assert_eq!(record.ra, 1.5);
    }

    #[test]
    fn parse_line_reads_every_field() {
        let record = parse_line(SAMPLE_LINE, 1).unwrap();
        assert_eq!(record.dec, sexagesimal_to_decimal(20.0, 15.0, 36.0));
        assert_eq!(record.shadow_distance, 1234.5);
        assert_eq!(record.shadow_altitude, 567.8);
        assert_eq!(record.target_azimuth, 180.0);
        assert_eq!(record.target_zenith, 45.0);
        assert_eq!(record.sun_azimuth, 90.0);
        assert_eq!(record.sun_zenith, 110.0);
        assert_eq!(record.diff_azimuth, 90.0);
        assert_eq!(record.last, 12.0);
        assert_eq!(record.vlsr, -5.2);
        assert_eq!(record.galactic_longitude, 3.0);
        assert_eq!(record.hour_angle, -1.25);
    }

    #[test]
    fn parse_line_keeps_utc_verbatim() {
        let record = parse_line(SAMPLE_LINE, 1).unwrap();
        assert_eq!(record.utc, "2000 01 01 06 00 00.000");
    }

    #[test]
    fn negative_degrees_do_not_carry_sign_into_minutes() {
        let record = parse_line(SAMPLE_LINE, 1).unwrap();
        assert_eq!(record.galactic_latitude, -9.5);
    }

    #[test]
    fn parse_line_tolerates_padded_values() {
        let line = sample_line(412.25, "2000 03 04 05 06 07.250");
        let record = parse_line(&line, 7).unwrap();
        assert_eq!(record.ra, sexagesimal_to_decimal(2.0, 15.0, 36.0));
        assert_eq!(record.dec, sexagesimal_to_decimal(40.0, 6.0, 18.0));
        assert_eq!(record.shadow_altitude, 412.25);
        assert_eq!(record.utc, "2000 03 04 05 06 07.250");
    }

    #[test]
    fn decimal_conversion_matches_independent_formula() {
        for (d, m, s) in [(0.0, 0.0, 0.0), (23.0, 59.0, 59.9), (5.0, 7.0, 12.34)] {
            let line = SAMPLE_LINE.replacen("1H 30M 0S", &format!("{d}H {m}M {s}S"), 1);
            let record = parse_line(&line, 1).unwrap();
            assert_eq!(record.ra, d + m / 60.0 + s / 3600.0);
        }
    }

    #[test]
    fn parse_line_rejects_missing_prefix() {
        let result = parse_line("shadow: no solution\n", 3);
        assert!(matches!(
            result,
            Err(GeometryParseError::MissingPrefix { line: 3, .. })
        ));
    }

    #[test]
    fn parse_line_reports_missing_delimiter_with_field_name() {
        let truncated = "ra/dec 1H 30M 0S 20D 15' 36\" shadow distance 1234.5 km altitude 567.8";
        match parse_line(truncated, 2) {
            Err(GeometryParseError::MissingDelimiter {
                line,
                field,
                expected,
                found,
            }) => {
                assert_eq!(line, 2);
                assert_eq!(field, "shdalt");
                assert_eq!(expected, "km targ az");
                assert_eq!(found, "567.8");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn parse_line_reports_non_numeric_field() {
        let line = SAMPLE_LINE.replace("vlsr -5.2", "vlsr fast");
        assert!(matches!(
            parse_line(&line, 1),
            Err(GeometryParseError::InvalidNumber { field: "vlsr", .. })
        ));
    }

    #[test]
    fn parse_output_skips_blank_lines_and_keeps_order() {
        let text = format!(
            "{}\n{}",
            sample_line(100.0, "2000 01 01 00 00 00.000"),
            sample_line(50.0, "2000 01 01 00 10 00.000")
        );
        let records = parse_output(&text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].shadow_altitude, 100.0);
        assert_eq!(records[1].shadow_altitude, 50.0);
    }

    #[test]
    fn parse_output_reports_line_number_of_bad_line() {
        let text = format!("{}garbage\n", sample_line(1.0, "x"));
        assert!(matches!(
            parse_output(&text),
            Err(GeometryParseError::MissingPrefix { line: 2, .. })
        ));
    }
}
