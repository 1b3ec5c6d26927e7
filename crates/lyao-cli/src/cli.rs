use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "lyao - drive the shadow geometry and LYAO_RT transport executables over a grid of dates and solar fluxes, and inspect the archived results.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the geometry and transport executables for every day, f10.7 value and AM/PM period.
    Sweep(SweepArgs),
    /// Summarize an archived run directory and optionally export its line-of-sight series.
    Inspect(InspectArgs),
    /// Print the AM, PM and midnight boundaries used for one observing night.
    Window(WindowArgs),
}

/// Arguments for the `sweep` subcommand.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Path to the sweep configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the archive root directory from the config file.
    #[arg(short, long = "archive-root", value_name = "DIR")]
    pub archive_root: Option<PathBuf>,

    /// Override the observing site with a preset name (pbo, kpno, wiyn, ctio, erau).
    #[arg(long, value_name = "NAME")]
    pub site: Option<String>,

    /// Override the first day of year to run.
    #[arg(long, value_name = "DOY")]
    pub first_day: Option<u32>,

    /// Override the last day of year to run.
    #[arg(long, value_name = "DOY")]
    pub last_day: Option<u32>,

    /// Stop at the first failed run instead of recording it and moving on.
    #[arg(long)]
    pub stop_on_error: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S flux.ap=12
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Directory holding one run's driver echo, source and line-of-sight files.
    #[arg(required = true, value_name = "DIR")]
    pub dir: PathBuf,

    /// Write the sorted line-of-sight series to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Accept duplicate artifacts and keep the last one in file-name order.
    #[arg(long)]
    pub last_wins: bool,
}

/// Arguments for the `window` subcommand.
#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Calendar date of the night (YYYY-MM-DD).
    #[arg(short, long, required = true, value_name = "DATE")]
    pub date: NaiveDate,

    /// Hours to add to local time to get UTC.
    #[arg(short, long, required = true, value_name = "HOURS", allow_hyphen_values = true)]
    pub utc_offset: i32,

    #[command(flatten)]
    pub twilight: TwilightArgs,
}

/// Exactly one source for the dawn and dusk times.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct TwilightArgs {
    /// Sunrise/sunset or twilight table to read the times from.
    #[arg(long, value_name = "PATH")]
    pub calendar: Option<PathBuf>,

    /// Fixed local AM and PM hours instead of a table.
    #[arg(long, num_args = 2, value_names = ["AM", "PM"])]
    pub fixed_hours: Option<Vec<u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_arguments_parse() {
        let cli = Cli::parse_from([
            "lyao", "-vv", "sweep", "-c", "pbo.toml", "--site", "kpno", "--first-day", "10",
            "-S", "flux.ap=12", "-S", "time.year=2001", "--stop-on-error",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        assert_eq!(args.config, PathBuf::from("pbo.toml"));
        assert_eq!(args.site.as_deref(), Some("kpno"));
        assert_eq!(args.first_day, Some(10));
        assert_eq!(args.last_day, None);
        assert!(args.stop_on_error);
        assert_eq!(args.set_values, ["flux.ap=12", "time.year=2001"]);
    }

    #[test]
    fn inspect_arguments_parse() {
        let cli = Cli::parse_from(["lyao", "inspect", "runs/DOY_34", "--csv", "out.csv"]);
        let Commands::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(args.dir, PathBuf::from("runs/DOY_34"));
        assert_eq!(args.csv, Some(PathBuf::from("out.csv")));
        assert!(!args.last_wins);
    }

    #[test]
    fn window_accepts_negative_offset_and_fixed_hours() {
        let cli = Cli::parse_from([
            "lyao", "window", "--date", "2000-02-03", "--utc-offset", "-3", "--fixed-hours", "9",
            "15",
        ]);
        let Commands::Window(args) = cli.command else {
            panic!("expected window");
        };
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2000, 2, 3).unwrap());
        assert_eq!(args.utc_offset, -3);
        assert_eq!(args.twilight.fixed_hours, Some(vec![9, 15]));
        assert!(args.twilight.calendar.is_none());
    }

    #[test]
    fn window_requires_exactly_one_twilight_source() {
        let missing = Cli::try_parse_from(["lyao", "window", "-d", "2000-02-03", "-u", "6"]);
        assert!(missing.is_err());
        let both = Cli::try_parse_from([
            "lyao", "window", "-d", "2000-02-03", "-u", "6", "--calendar", "pbo.txt",
            "--fixed-hours", "9", "15",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["lyao", "-q", "-v", "inspect", "run"]);
        assert!(result.is_err());
    }
}
