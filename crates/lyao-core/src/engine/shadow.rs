use super::command::{CommandRunner, ExternalCommand};
use super::error::EngineError;
use crate::core::geometry::{GeometryRecord, parse_output};
use crate::core::io::atomic::write_atomic;
use crate::core::site::Location;
use crate::core::timing::ShadowTime;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_PROGRAM: &str = "shadow";
pub const OUTPUT_FILE: &str = "output.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowTimeSpec {
    At(ShadowTime),
    Interval {
        from: ShadowTime,
        to: ShadowTime,
        step_minutes: u32,
    },
}

impl ShadowTimeSpec {
    fn push_args(&self, args: &mut Vec<String>) {
        match self {
            ShadowTimeSpec::At(t) => {
                args.push("-utc".into());
                args.extend(t.to_args());
                let millis = t.datetime().and_utc().timestamp_subsec_millis();
                if let Some(seconds) = args.last_mut() {
                    seconds.push_str(&format!(".{millis:03}"));
                }
            }
            ShadowTimeSpec::Interval {
                from,
                to,
                step_minutes,
            } => {
                args.push("-from".into());
                args.extend(from.to_args());
                args.push("-to".into());
                args.extend(to.to_args());
                args.push("-dt".into());
                args.push(step_minutes.to_string());
            }
        }
    }
}

impl fmt::Display for ShadowTimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowTimeSpec::At(t) => write!(f, "{t}"),
            ShadowTimeSpec::Interval {
                from,
                to,
                step_minutes,
            } => write!(f, "{from} to {to} every {step_minutes} min"),
        }
    }
}

/// Telescope pointing pair. With none given, shadow uses its default target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pointing {
    RaDec { ra: f64, dec: f64 },
    HaDec { ha: f64, dec: f64 },
    AzEl { az: f64, el: f64 },
}

impl Pointing {
    fn push_args(&self, args: &mut Vec<String>) {
        let (a, x, b, y) = match *self {
            Pointing::RaDec { ra, dec } => ("-ra", ra, "-dec", dec),
            Pointing::HaDec { ha, dec } => ("-ha", ha, "-dec", dec),
            Pointing::AzEl { az, el } => ("-az", az, "-el", el),
        };
        args.extend([a.to_string(), format!("{x:.3}"), b.to_string(), format!("{y:.3}")]);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowRequest<'a> {
    pub location: &'a Location,
    pub time: ShadowTimeSpec,
    /// Passed in order; shadow accepts several pairs in one call.
    pub pointing: &'a [Pointing],
}

impl ShadowRequest<'_> {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = self.location.shadow_args();
        self.time.push_args(&mut args);
        for p in self.pointing {
            p.push_args(&mut args);
        }
        args
    }
}

/// The shadow geometry program and the directory it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowExecutable {
    pub dir: PathBuf,
    pub program: PathBuf,
}

impl ShadowExecutable {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            program: PathBuf::from(DEFAULT_PROGRAM),
        }
    }

    pub fn program_path(&self) -> PathBuf {
        self.dir.join(&self.program)
    }

    /// Where the captured stdout of the last run is kept.
    pub fn output_path(&self) -> PathBuf {
        self.dir.join(OUTPUT_FILE)
    }

    pub fn command(&self, request: &ShadowRequest<'_>) -> ExternalCommand {
        ExternalCommand::new(self.program_path()).args(request.to_args())
    }

    /// Runs shadow, saves its stdout to [`OUTPUT_FILE`] and parses every line.
    ///
    /// # Errors
    ///
    /// Fails if the program cannot start or exits non-zero, if any output line
    /// does not match the shadow grammar, or if no samples were produced.
    pub fn run(
        &self,
        runner: &mut dyn CommandRunner,
        request: &ShadowRequest<'_>,
    ) -> Result<Vec<GeometryRecord>, EngineError> {
        let command = self.command(request);
        let output = runner.run(&command)?.ensure_success(&command)?;

        let output_path = self.output_path();
        save_output(&output_path, &output.stdout)?;

        let records = parse_output(&output.stdout)?;
        debug!(samples = records.len(), time = %request.time, "Parsed shadow output");
        if records.is_empty() {
            return Err(EngineError::EmptyGeometry {
                interval: request.time.to_string(),
            });
        }
        Ok(records)
    }
}

fn save_output(path: &Path, stdout: &str) -> Result<(), EngineError> {
    write_atomic(path, stdout.as_bytes()).map_err(EngineError::io(path))
}
