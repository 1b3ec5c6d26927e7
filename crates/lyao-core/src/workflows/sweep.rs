use crate::core::calendar::CalendarTable;
use crate::core::io::driver::RunParameters;
use crate::core::timing::{TimeWindow, TimingError, TwilightSource, resolve_window};
use crate::engine::archive::{Archive, Period, RunKey};
use crate::engine::command::CommandRunner;
use crate::engine::config::{SweepConfig, TwilightConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::shadow::{ShadowRequest, ShadowTimeSpec};
use chrono::{Datelike, NaiveDate, NaiveTime};
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct FailedRun {
    pub key: RunKey,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepSummary {
    pub archive_root: PathBuf,
    /// Runs whose four files were all archived.
    pub completed: u64,
    pub failed: Vec<FailedRun>,
}

/// Runs every (day, f10.7, AM/PM) combination of the grid in order.
///
/// Each run executes shadow for the night's AM or PM interval, stages the
/// line-of-sight and driver files, runs the transport model and copies all
/// four files into the archive. A failing run is logged and recorded in the
/// summary; with `continue_on_error` unset it stops the sweep instead.
#[instrument(skip_all, name = "sweep_workflow")]
pub fn run(
    config: &SweepConfig,
    runner: &mut dyn CommandRunner,
    reporter: &ProgressReporter,
) -> Result<SweepSummary, EngineError> {
    let table;
    let source = match &config.grid.twilight {
        TwilightConfig::Calendar(path) => {
            table = CalendarTable::from_path(path)?;
            TwilightSource::Calendar(&table)
        }
        TwilightConfig::FixedHours { am_hour, pm_hour } => TwilightSource::FixedHours {
            am_hour: *am_hour,
            pm_hour: *pm_hour,
        },
    };

    let archive = Archive::new(&config.paths.archive_root);
    let mut summary = SweepSummary {
        archive_root: config.paths.archive_root.clone(),
        ..SweepSummary::default()
    };

    let total_runs = config.total_runs();
    info!(
        total_runs,
        location = %config.location,
        archive = %archive.root().display(),
        "Starting sweep"
    );
    reporter.report(Progress::SweepStart { total_runs });

    for date in config.grid.dates() {
        let day_of_year = date.ordinal();
        let utc_offset = config.grid.utc_offset_on(day_of_year);
        let keys = config.f107.iter().flat_map(|&f107| {
            Period::BOTH.into_iter().map(move |period| RunKey {
                day_of_year,
                f107,
                period,
            })
        });

        let window = match resolve_window(date, utc_offset, &source) {
            Ok(window) => window,
            Err(e) => {
                let e = EngineError::from(e);
                warn!(day_of_year, error = %e, "Cannot resolve time window, skipping day");
                if !config.continue_on_error {
                    return Err(e);
                }
                for key in keys {
                    reporter.report(Progress::RunStart { key });
                    record_failure(&mut summary, reporter, key, &e);
                }
                continue;
            }
        };
        debug!(
            day_of_year,
            utc_offset,
            am = %window.am,
            pm = %window.pm,
            midnight = %window.midnight,
            "Resolved time window"
        );
        reporter.message(format!(
            "Day {day_of_year}: PM {}, midnight {}, AM {}",
            window.pm, window.midnight, window.am
        ));

        for key in keys {
            reporter.report(Progress::RunStart { key });
            match run_once(config, runner, &archive, &window, date, key) {
                Ok(()) => {
                    summary.completed += 1;
                    info!(
                        run = %key,
                        completed = summary.completed,
                        dir = %archive.run_dir(&key).display(),
                        "Run saved"
                    );
                    reporter.report(Progress::RunFinish {
                        key,
                        completed: summary.completed,
                    });
                }
                Err(e) => {
                    warn!(run = %key, error = %e, "Run failed");
                    if !config.continue_on_error {
                        return Err(e);
                    }
                    record_failure(&mut summary, reporter, key, &e);
                }
            }
        }
    }

    reporter.report(Progress::SweepFinish {
        completed: summary.completed,
        failed: summary.failed.len() as u64,
    });
    info!(
        completed = summary.completed,
        failed = summary.failed.len(),
        "Sweep complete"
    );
    Ok(summary)
}

fn run_once(
    config: &SweepConfig,
    runner: &mut dyn CommandRunner,
    archive: &Archive,
    window: &TimeWindow,
    date: NaiveDate,
    key: RunKey,
) -> Result<(), EngineError> {
    let grid = &config.grid;
    let (interval, hour) = match key.period {
        Period::Am => (
            ShadowTimeSpec::Interval {
                from: window.midnight,
                to: window.am,
                step_minutes: grid.step_minutes,
            },
            grid.am_hour,
        ),
        Period::Pm => (
            ShadowTimeSpec::Interval {
                from: window.pm,
                to: window.midnight,
                step_minutes: grid.step_minutes,
            },
            grid.pm_hour,
        ),
    };

    archive.prepare(&key)?;

    let request = ShadowRequest {
        location: &config.location,
        time: interval,
        pointing: &config.pointing,
    };
    let records = config.paths.shadow.run(runner, &request)?;

    let observed = NaiveTime::from_hms_opt(hour, 0, 0).ok_or(TimingError::InvalidHour {
        hour: i64::from(hour),
        utc_offset: 0,
    })?;
    let params = RunParameters::new(
        &config.location,
        date.and_time(observed),
        key.f107,
        config.ap,
    )?
    .with_defaults(config.driver);

    let transport = &config.paths.transport;
    let staged = transport.stage(&records, config.los_header, &params)?;

    info!(run = %key, samples = records.len(), "Begin transport run");
    let outputs = transport.run(runner)?;

    // Nothing is archived until the transport outputs exist, so a failed
    // re-run leaves the previous run's four files together.
    for file in [&staged.los_input, &staged.driver, &outputs.source, &outputs.los] {
        archive.store(&key, file)?;
    }
    Ok(())
}

fn record_failure(
    summary: &mut SweepSummary,
    reporter: &ProgressReporter,
    key: RunKey,
    error: &EngineError,
) {
    let reason = error.to_string();
    reporter.report(Progress::RunFailed {
        key,
        reason: reason.clone(),
    });
    summary.failed.push(FailedRun { key, reason });
}
