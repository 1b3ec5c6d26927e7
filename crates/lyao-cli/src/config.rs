use crate::cli::SweepArgs;
use crate::error::{CliError, Result};
use lyao::core::io::driver::{DriverDefaults, HydrogenOverrides};
use lyao::core::io::los_input::LosHeader;
use lyao::core::site::Location;
use lyao::engine::config::{self as core_config, DstRule, TwilightConfig};
use lyao::engine::shadow::Pointing;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialPathsConfig {
    shadow_dir: Option<PathBuf>,
    shadow_program: Option<PathBuf>,
    transport_dir: Option<PathBuf>,
    transport_program: Option<PathBuf>,
    archive_root: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialDstRule {
    first_day: u32,
    last_day: u32,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct PartialFixedHours {
    am: u32,
    pm: u32,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialTimeConfig {
    year: Option<i32>,
    first_day: Option<u32>,
    last_day: Option<u32>,
    utc_offset: Option<i32>,
    dst: Option<PartialDstRule>,
    calendar: Option<PathBuf>,
    fixed_hours: Option<PartialFixedHours>,
    step_minutes: Option<u32>,
    am_hour: Option<u32>,
    pm_hour: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSiteConfig {
    preset: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "kebab-case", tag = "type")]
enum PartialPointing {
    RaDec { ra: f64, dec: f64 },
    HaDec { ha: f64, dec: f64 },
    AzEl { az: f64, el: f64 },
}

impl From<PartialPointing> for Pointing {
    fn from(p: PartialPointing) -> Self {
        match p {
            PartialPointing::RaDec { ra, dec } => Pointing::RaDec { ra, dec },
            PartialPointing::HaDec { ha, dec } => Pointing::HaDec { ha, dec },
            PartialPointing::AzEl { az, el } => Pointing::AzEl { az, el },
        }
    }
}

/// Either an explicit list of f10.7 values or an inclusive linear range.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
enum PartialFluxGrid {
    List(Vec<f64>),
    Range { start: f64, stop: f64, count: usize },
}

impl PartialFluxGrid {
    fn values(&self) -> Vec<f64> {
        match self {
            PartialFluxGrid::List(values) => values.clone(),
            PartialFluxGrid::Range { start, stop, count } => {
                core_config::linspace(*start, *stop, *count)
            }
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialFluxConfig {
    f107: Option<PartialFluxGrid>,
    ap: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialDriverConfig {
    line_label: Option<i32>,
    msis_flag: Option<i32>,
    exobase_density: Option<f64>,
    vertical_flux: Option<f64>,
    mesopause_peak_density: Option<f64>,
    igeo_flag: Option<i32>,
    satellite_temperature: Option<i32>,
    satellite_density: Option<f64>,
}

impl PartialDriverConfig {
    fn into_defaults(self) -> DriverDefaults {
        let base = DriverDefaults::default();
        DriverDefaults {
            line_label: self.line_label.unwrap_or(base.line_label),
            msis_flag: self.msis_flag.unwrap_or(base.msis_flag),
            hydrogen: HydrogenOverrides {
                exobase_density: self
                    .exobase_density
                    .unwrap_or(base.hydrogen.exobase_density),
                vertical_flux: self.vertical_flux.unwrap_or(base.hydrogen.vertical_flux),
                mesopause_peak_density: self
                    .mesopause_peak_density
                    .unwrap_or(base.hydrogen.mesopause_peak_density),
            },
            igeo_flag: self.igeo_flag.unwrap_or(base.igeo_flag),
            satellite_temperature: self
                .satellite_temperature
                .unwrap_or(base.satellite_temperature),
            satellite_density: self.satellite_density.unwrap_or(base.satellite_density),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialLosHeaderConfig {
    line_label: Option<i32>,
    wavelength: Option<f64>,
    branching_ratio: Option<f64>,
    line_center_flux: Option<f64>,
}

impl PartialLosHeaderConfig {
    fn into_header(self) -> LosHeader {
        let base = LosHeader::default();
        LosHeader {
            line_label: self.line_label.unwrap_or(base.line_label),
            wavelength: self.wavelength.unwrap_or(base.wavelength),
            branching_ratio: self.branching_ratio.unwrap_or(base.branching_ratio),
            line_center_flux: self.line_center_flux.unwrap_or(base.line_center_flux),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialSweepConfig {
    paths: Option<PartialPathsConfig>,
    time: Option<PartialTimeConfig>,
    site: Option<PartialSiteConfig>,
    pointing: Option<Vec<PartialPointing>>,
    flux: Option<PartialFluxConfig>,
    driver: Option<PartialDriverConfig>,
    los_header: Option<PartialLosHeaderConfig>,
    continue_on_error: Option<bool>,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: '{}' ({})",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}

/// Relative paths in the config file are taken relative to the file itself.
fn anchor(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path
    }
}

impl PartialSweepConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Applies `-S` overrides and command-line flags, then builds the core
    /// configuration. `base_dir` anchors relative paths from the file.
    pub fn merge_with_cli(
        mut self,
        args: &SweepArgs,
        base_dir: &Path,
    ) -> Result<core_config::SweepConfig> {
        self.apply_set_values(&args.set_values)?;

        let paths = self.paths.take().unwrap_or_default();
        let time = self.time.take().unwrap_or_default();
        let site = self.site.take().unwrap_or_default();
        let flux = self.flux.take().unwrap_or_default();

        let required = |value: Option<PathBuf>, key: &str| -> Result<PathBuf> {
            value.map(|p| anchor(base_dir, p)).ok_or_else(|| {
                CliError::Config(format!(
                    "A value for '{}' is required either in the config file or via CLI argument.",
                    key
                ))
            })
        };

        let archive_root = match &args.archive_root {
            Some(dir) => dir.clone(),
            None => required(paths.archive_root, "paths.archive-root")?,
        };

        let mut builder = core_config::SweepConfigBuilder::new()
            .shadow_dir(required(paths.shadow_dir, "paths.shadow-dir")?)
            .transport_dir(required(paths.transport_dir, "paths.transport-dir")?)
            .archive_root(archive_root)
            .location(Self::merge_site(site, args.site.as_deref())?)
            .twilight(Self::merge_twilight(&time, base_dir)?)
            .dst(time.dst.map(|r| DstRule {
                first_day: r.first_day,
                last_day: r.last_day,
            }))
            .pointing(
                self.pointing
                    .unwrap_or_default()
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            )
            .driver(self.driver.unwrap_or_default().into_defaults())
            .los_header(self.los_header.unwrap_or_default().into_header());

        if let Some(program) = paths.shadow_program {
            builder = builder.shadow_program(program);
        }
        if let Some(program) = paths.transport_program {
            builder = builder.transport_program(program);
        }
        if let Some(year) = time.year {
            builder = builder.year(year);
        }
        if let Some(day) = args.first_day.or(time.first_day) {
            builder = builder.first_day(day);
        }
        if let Some(day) = args.last_day.or(time.last_day) {
            builder = builder.last_day(day);
        }
        if let Some(offset) = time.utc_offset {
            builder = builder.utc_offset(offset);
        }
        if let Some(step) = time.step_minutes {
            builder = builder.step_minutes(step);
        }
        builder = builder.observation_hours(
            time.am_hour.unwrap_or(core_config::DEFAULT_AM_HOUR_UT),
            time.pm_hour.unwrap_or(core_config::DEFAULT_PM_HOUR_UT),
        );
        if let Some(grid) = &flux.f107 {
            builder = builder.f107(grid.values());
        }
        if let Some(ap) = flux.ap {
            builder = builder.ap(ap);
        }
        let keep_going = !args.stop_on_error && self.continue_on_error.unwrap_or(true);
        builder = builder.continue_on_error(keep_going);

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_site(site: PartialSiteConfig, cli_preset: Option<&str>) -> Result<Location> {
        if let Some(name) = cli_preset.or(site.preset.as_deref()) {
            return Location::preset(name).map_err(|e| CliError::Config(e.to_string()));
        }
        match (site.latitude, site.longitude, site.altitude) {
            (Some(lat), Some(lon), Some(alt)) => Ok(Location::explicit(lat, lon, alt)),
            (None, None, None) => Err(CliError::Config(
                "`site` needs either a `preset` or `latitude`, `longitude` and `altitude`."
                    .to_string(),
            )),
            _ => Err(CliError::Config(
                "An explicit `site` requires all of `latitude`, `longitude` and `altitude`."
                    .to_string(),
            )),
        }
    }

    fn merge_twilight(time: &PartialTimeConfig, base_dir: &Path) -> Result<TwilightConfig> {
        match (&time.calendar, time.fixed_hours) {
            (Some(path), None) => Ok(TwilightConfig::Calendar(anchor(base_dir, path.clone()))),
            (None, Some(hours)) => Ok(TwilightConfig::FixedHours {
                am_hour: hours.am,
                pm_hour: hours.pm,
            }),
            (Some(_), Some(_)) => Err(CliError::Config(
                "`time.calendar` and `time.fixed-hours` are mutually exclusive.".to_string(),
            )),
            (None, None) => Err(CliError::Config(
                "One of `time.calendar` or `time.fixed-hours` is required.".to_string(),
            )),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();

            match key {
                "paths.archive-root" => {
                    self.paths.get_or_insert_with(Default::default).archive_root =
                        Some(PathBuf::from(value));
                }
                "time.year" => {
                    self.time.get_or_insert_with(Default::default).year =
                        Some(parse_value(key, value)?);
                }
                "time.first-day" => {
                    self.time.get_or_insert_with(Default::default).first_day =
                        Some(parse_value(key, value)?);
                }
                "time.last-day" => {
                    self.time.get_or_insert_with(Default::default).last_day =
                        Some(parse_value(key, value)?);
                }
                "time.utc-offset" => {
                    self.time.get_or_insert_with(Default::default).utc_offset =
                        Some(parse_value(key, value)?);
                }
                "time.step-minutes" => {
                    self.time.get_or_insert_with(Default::default).step_minutes =
                        Some(parse_value(key, value)?);
                }
                "site.preset" => {
                    self.site.get_or_insert_with(Default::default).preset =
                        Some(value.trim().to_string());
                }
                "flux.ap" => {
                    self.flux.get_or_insert_with(Default::default).ap =
                        Some(parse_value(key, value)?);
                }
                "flux.f107" => {
                    let values = value
                        .split(',')
                        .map(|v| parse_value(key, v))
                        .collect::<Result<Vec<f64>>>()?;
                    self.flux.get_or_insert_with(Default::default).f107 =
                        Some(PartialFluxGrid::List(values));
                }
                "continue-on-error" => {
                    self.continue_on_error = Some(parse_value(key, value)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use once_cell::sync::Lazy;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    const BASE_CONFIG: &str = r#"
        continue-on-error = true

        [paths]
        shadow-dir = "/opt/shadow"
        transport-dir = "/opt/lyao"
        archive-root = "runs"

        [time]
        year = 2000
        first-day = 30
        last-day = 40
        utc-offset = 6
        calendar = "pbo_2000.txt"
        dst = { first-day = 93, last-day = 303 }

        [site]
        preset = "pbo"

        [flux]
        f107 = { start = 50.0, stop = 270.0, count = 12 }
        ap = 8.0
    "#;

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn sweep_args(extra: &[&str]) -> SweepArgs {
        let mut argv = vec!["lyao", "sweep", "-c", "sweep.toml"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Sweep(args) => args,
            other => panic!("expected sweep, got {other:?}"),
        }
    }

    #[test]
    fn file_config_merges_with_defaults() {
        let path = write_config_file("base.toml", BASE_CONFIG);
        let partial = PartialSweepConfig::from_file(&path).unwrap();
        let config = partial
            .merge_with_cli(&sweep_args(&[]), TEST_DIR.path())
            .unwrap();

        assert_eq!(config.paths.archive_root, TEST_DIR.path().join("runs"));
        assert_eq!(config.paths.shadow.dir, PathBuf::from("/opt/shadow"));
        assert_eq!(config.grid.days, 30..=40);
        assert_eq!(
            config.grid.twilight,
            TwilightConfig::Calendar(TEST_DIR.path().join("pbo_2000.txt"))
        );
        assert_eq!(config.grid.dst, Some(DstRule::US_2000));
        assert_eq!(config.grid.step_minutes, 10);
        assert_eq!((config.grid.am_hour, config.grid.pm_hour), (11, 4));
        assert_eq!(config.f107.len(), 12);
        assert_eq!(config.f107[1], 70.0);
        assert_eq!(config.ap, 8.0);
        assert_eq!(config.location, Location::preset("pbo").unwrap());
        assert_eq!(config.driver, DriverDefaults::default());
        assert_eq!(config.los_header, LosHeader::LYMAN_BETA);
        assert!(config.pointing.is_empty());
        assert!(config.continue_on_error);
    }

    #[test]
    fn cli_flags_override_file_values() {
        let partial = PartialSweepConfig::from_toml(BASE_CONFIG).unwrap();
        let args = sweep_args(&[
            "--site",
            "ctio",
            "--first-day",
            "35",
            "-a",
            "/scratch/ctio",
            "--stop-on-error",
        ]);
        let config = partial.merge_with_cli(&args, Path::new("/etc/lyao")).unwrap();

        assert_eq!(config.location, Location::preset("ctio").unwrap());
        assert_eq!(config.grid.days, 35..=40);
        assert_eq!(config.paths.archive_root, PathBuf::from("/scratch/ctio"));
        assert!(!config.continue_on_error);
    }

    #[test]
    fn set_values_override_file_values() {
        let partial = PartialSweepConfig::from_toml(BASE_CONFIG).unwrap();
        let args = sweep_args(&[
            "-S",
            "flux.f107=70, 90",
            "-S",
            "flux.ap=12",
            "-S",
            "time.utc-offset=7",
            "-S",
            "continue-on-error=false",
        ]);
        let config = partial.merge_with_cli(&args, Path::new("/etc/lyao")).unwrap();

        assert_eq!(config.f107, vec![70.0, 90.0]);
        assert_eq!(config.ap, 12.0);
        assert_eq!(config.grid.utc_offset, 7);
        assert!(!config.continue_on_error);
    }

    #[test]
    fn unsupported_or_malformed_set_values_fail() {
        let partial = PartialSweepConfig::from_toml(BASE_CONFIG).unwrap();
        let result = partial.merge_with_cli(&sweep_args(&["-S", "flux.kp=3"]), Path::new("/"));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("flux.kp")));

        let partial = PartialSweepConfig::from_toml(BASE_CONFIG).unwrap();
        let result = partial.merge_with_cli(&sweep_args(&["-S", "flux.ap"]), Path::new("/"));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("KEY=VALUE")));

        let partial = PartialSweepConfig::from_toml(BASE_CONFIG).unwrap();
        let result = partial.merge_with_cli(&sweep_args(&["-S", "time.year=two"]), Path::new("/"));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("time.year")));
    }

    #[test]
    fn explicit_site_pointing_and_driver_overrides() {
        let content = r#"
            [paths]
            shadow-dir = "/opt/shadow"
            shadow-program = "/usr/local/bin/shadow"
            transport-dir = "/opt/lyao"
            archive-root = "/data"

            [time]
            year = 2001
            utc-offset = 3
            fixed-hours = { am = 9, pm = 15 }
            step-minutes = 5

            [site]
            latitude = -30.1725
            longitude = -70.7993
            altitude = 2200.0

            [[pointing]]
            type = "az-el"
            az = 180.0
            el = 45.0

            [[pointing]]
            type = "ha-dec"
            ha = 1.5
            dec = 20.0

            [flux]
            f107 = [60.0, 120.0, 180.0]

            [driver]
            exobase-density = 5.0e4
            satellite-temperature = 900

            [los-header]
            line-label = 3
        "#;
        let partial = PartialSweepConfig::from_toml(content).unwrap();
        let config = partial
            .merge_with_cli(&sweep_args(&[]), Path::new("/etc"))
            .unwrap();

        assert_eq!(config.location, Location::explicit(-30.1725, -70.7993, 2200.0));
        assert_eq!(
            config.pointing,
            [
                Pointing::AzEl { az: 180.0, el: 45.0 },
                Pointing::HaDec { ha: 1.5, dec: 20.0 },
            ]
        );
        assert_eq!(
            config.grid.twilight,
            TwilightConfig::FixedHours {
                am_hour: 9,
                pm_hour: 15
            }
        );
        assert_eq!(config.grid.days, 1..=365);
        assert_eq!(config.grid.step_minutes, 5);
        assert_eq!(config.f107, vec![60.0, 120.0, 180.0]);
        assert_eq!(config.paths.shadow.program, PathBuf::from("/usr/local/bin/shadow"));
        assert_eq!(config.driver.hydrogen.exobase_density, 5.0e4);
        assert_eq!(config.driver.hydrogen.vertical_flux, -1.0);
        assert_eq!(config.driver.satellite_temperature, 900);
        assert_eq!(config.los_header.line_label, 3);
        assert_eq!(config.los_header.wavelength, 1025.72);
    }

    #[test]
    fn missing_required_values_are_reported() {
        let partial = PartialSweepConfig::from_toml("[site]\npreset = \"pbo\"\n").unwrap();
        let result = partial.merge_with_cli(&sweep_args(&[]), Path::new("/"));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("paths.archive-root")));
    }

    #[test]
    fn conflicting_twilight_sources_are_rejected() {
        let content = BASE_CONFIG.replace(
            "calendar = \"pbo_2000.txt\"",
            "calendar = \"pbo_2000.txt\"\nfixed-hours = { am = 9, pm = 15 }",
        );
        let partial = PartialSweepConfig::from_toml(&content).unwrap();
        let result = partial.merge_with_cli(&sweep_args(&[]), Path::new("/"));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("mutually exclusive")));
    }

    #[test]
    fn unknown_preset_and_partial_site_fail() {
        let partial = PartialSweepConfig::from_toml(BASE_CONFIG).unwrap();
        let result = partial.merge_with_cli(&sweep_args(&["--site", "mauna-kea"]), Path::new("/"));
        assert!(matches!(result, Err(CliError::Config(_))));

        let content = BASE_CONFIG.replace("preset = \"pbo\"", "latitude = 43.0");
        let partial = PartialSweepConfig::from_toml(&content).unwrap();
        let result = partial.merge_with_cli(&sweep_args(&[]), Path::new("/"));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("all of")));
    }

    #[test]
    fn unknown_keys_are_rejected_by_the_parser() {
        let path = write_config_file("typo.toml", "[flux]\nf10.7 = [70.0]\n");
        let result = PartialSweepConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn bundled_example_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../sweep.example.toml");
        let partial = PartialSweepConfig::from_file(&path).unwrap();
        let base_dir = path.parent().unwrap();
        let config = partial.merge_with_cli(&sweep_args(&[]), base_dir).unwrap();
        assert_eq!(config.total_runs(), 366 * 12 * 2);
        assert_eq!(config.driver, DriverDefaults::default());
        assert_eq!(config.los_header, LosHeader::LYMAN_BETA);
    }

    #[test]
    fn core_builder_errors_become_config_errors() {
        let content = BASE_CONFIG.replace("last-day = 40", "last-day = 400");
        let partial = PartialSweepConfig::from_toml(&content).unwrap();
        let result = partial.merge_with_cli(&sweep_args(&[]), Path::new("/"));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("days")));
    }
}
