use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use lyao::core::io::atomic::write_atomic_with;
use lyao::core::io::format::exponential;
use lyao::core::results::los::LosSeries;
use lyao::core::results::run::{DuplicatePolicy, RunResult};
use std::fmt::Write as _;
use std::io;
use std::path::Path;
use tracing::info;

pub fn run(args: InspectArgs) -> Result<()> {
    let policy = if args.last_wins {
        DuplicatePolicy::LastWins
    } else {
        DuplicatePolicy::Error
    };
    let result = RunResult::load_with(&args.dir, policy)?;
    info!(dir = %args.dir.display(), samples = result.los.len(), "Loaded run result");

    println!("{}", render_summary(&result));

    if let Some(path) = &args.csv {
        export_csv(&result.los, path)?;
        println!("Line-of-sight series written to: {}", path.display());
    }
    Ok(())
}

pub(crate) fn export_csv(series: &LosSeries, path: &Path) -> Result<()> {
    write_atomic_with(path, |w| series.write_csv(w).map_err(io::Error::other)).map_err(|e| {
        CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        }
    })
}

fn render_summary(result: &RunResult) -> String {
    let echo = &result.infile;
    let source = &result.source;
    let mut out = String::new();

    let _ = writeln!(out, "{}", echo.info);
    let _ = writeln!(
        out,
        "Site {:.4}, {:.4}  day {} of '{:02}  {:.2} UT  f10.7 {}  Ap {}",
        echo.latitude,
        echo.longitude,
        echo.day_of_year,
        echo.year,
        echo.hour,
        echo.f107_daily,
        echo.ap.first().copied().unwrap_or_default()
    );
    let _ = writeln!(
        out,
        "Columns (cm^-2): H {}  O {}  total {}  above exobase {}",
        exponential(source.column.hydrogen, 3),
        exponential(source.column.oxygen, 3),
        exponential(source.column.total, 3),
        exponential(source.column.above_exobase, 3)
    );
    let _ = writeln!(
        out,
        "Profile: {} MSIS levels, {} zones",
        source.msis.len(),
        source.zones.len()
    );

    let los = &result.los;
    match (los.samples().first(), los.samples().last()) {
        (Some(low), Some(high)) => {
            let peak = los.intensities().fold(f64::NEG_INFINITY, f64::max);
            let _ = write!(
                out,
                "Line of sight: {} samples, shadow altitude {:.1}-{:.1} km, peak {:.3} R",
                los.len(),
                low.altitude,
                high.altitude,
                peak
            );
        }
        _ => {
            let _ = write!(out, "Line of sight: no samples");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyao::core::results::los::LosSample;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn csv_export_is_sorted_by_altitude() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("los.csv");
        let series = LosSeries::from_samples(vec![
            LosSample {
                altitude: 900.5,
                intensity: 1.25,
            },
            LosSample {
                altitude: 300.0,
                intensity: 4.5,
            },
        ]);

        export_csv(&series, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "shadow_altitude_km,intensity_r");
        assert_eq!(lines[1], "300.0,4.5");
        assert_eq!(lines[2], "900.5,1.25");
    }

    #[test]
    fn export_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent").join("los.csv");
        let series = LosSeries::from_samples(Vec::new());
        assert!(matches!(
            export_csv(&series, &path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn empty_run_directory_reports_missing_artifact() {
        let dir = tempdir().unwrap();
        let args = InspectArgs {
            dir: dir.path().to_path_buf(),
            csv: None,
            last_wins: false,
        };
        assert!(matches!(run(args), Err(CliError::Results(_))));
    }
}
