use phf::{Map, phf_map};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SiteError {
    #[error("Unknown observatory preset '{0}'")]
    UnknownPreset(String),
    #[error("Observatory '{0}' has no latitude/longitude for the transport driver file")]
    MissingCoordinates(&'static str),
}

/// A named observing site known to both executables.
#[derive(Debug, PartialEq)]
pub struct Observatory {
    pub name: &'static str,
    /// Location flags passed to the shadow executable.
    pub shadow_args: &'static [&'static str],
    /// Geodetic latitude and longitude (degrees) written to the driver file.
    pub coordinates: Option<(f64, f64)>,
}

static OBSERVATORIES: Map<&'static str, Observatory> = phf_map! {
    "pbo" => Observatory {
        name: "pbo",
        shadow_args: &["-pbo"],
        coordinates: Some((43.0776, -89.6717)),
    },
    "kpno" => Observatory {
        name: "kpno",
        shadow_args: &["-wiyn"],
        coordinates: Some((31.9599, -111.5997)),
    },
    "wiyn" => Observatory {
        name: "wiyn",
        shadow_args: &["-wiyn"],
        coordinates: Some((31.9599, -111.5997)),
    },
    "ctio" => Observatory {
        name: "ctio",
        shadow_args: &["-lon", "-70", "47", "56.4", "-lat", "-30", "42", "46.8", "-alt", "2200"],
        coordinates: Some((-30.172509, -70.799266)),
    },
    "erau" => Observatory {
        name: "erau",
        shadow_args: &["-erau"],
        coordinates: None,
    },
};

pub fn preset_names() -> impl Iterator<Item = &'static str> {
    OBSERVATORIES.keys().copied()
}

/// Observer location: either a preset or explicit geodetic coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Preset(&'static Observatory),
    Explicit {
        /// Degrees north.
        latitude: f64,
        /// Degrees east.
        longitude: f64,
        /// Metres above sea level.
        altitude: f64,
    },
}

impl Location {
    pub fn preset(name: &str) -> Result<Self, SiteError> {
        let key = name.trim().to_ascii_lowercase();
        OBSERVATORIES
            .get(key.as_str())
            .map(Location::Preset)
            .ok_or_else(|| SiteError::UnknownPreset(name.to_string()))
    }

    pub fn explicit(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Location::Explicit {
            latitude,
            longitude,
            altitude,
        }
    }

    pub fn shadow_args(&self) -> Vec<String> {
        match self {
            Location::Preset(obs) => obs.shadow_args.iter().map(|s| s.to_string()).collect(),
            Location::Explicit {
                latitude,
                longitude,
                altitude,
            } => {
                let mut args = vec!["-lon".to_string()];
                args.extend(to_sexagesimal(*longitude).split(' ').map(str::to_string));
                args.push("-lat".to_string());
                args.extend(to_sexagesimal(*latitude).split(' ').map(str::to_string));
                args.push("-alt".to_string());
                args.push(altitude.to_string());
                args
            }
        }
    }

    /// Latitude and longitude in decimal degrees, as the driver file needs them.
    pub fn driver_coordinates(&self) -> Result<(f64, f64), SiteError> {
        match self {
            Location::Preset(obs) => obs
                .coordinates
                .ok_or(SiteError::MissingCoordinates(obs.name)),
            Location::Explicit {
                latitude,
                longitude,
                ..
            } => Ok((*latitude, *longitude)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Preset(obs) => write!(f, "{}", obs.name),
            Location::Explicit {
                latitude,
                longitude,
                altitude,
            } => write!(f, "({latitude:.4}, {longitude:.4}, {altitude} m)"),
        }
    }
}

/// Renders decimal degrees as `deg min sec` with one decimal on the seconds.
/// The sign sits on the degree field only.
pub fn to_sexagesimal(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let tenths = (value.abs() * 36_000.0).round() as u64;
    let degrees = tenths / 36_000;
    let minutes = (tenths % 36_000) / 600;
    let seconds = (tenths % 600) as f64 / 10.0;
    format!("{sign}{degrees} {minutes} {seconds:.1}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_case_insensitive() {
        let loc = Location::preset("PBO").unwrap();
        assert_eq!(loc.shadow_args(), ["-pbo"]);
        assert_eq!(loc.driver_coordinates().unwrap(), (43.0776, -89.6717));
    }

    #[test]
    fn kpno_uses_the_wiyn_flag() {
        let loc = Location::preset("kpno").unwrap();
        assert_eq!(loc.shadow_args(), ["-wiyn"]);
    }

    #[test]
    fn ctio_passes_explicit_coordinates_to_shadow() {
        let loc = Location::preset("ctio").unwrap();
        assert_eq!(
            loc.shadow_args().join(" "),
            "-lon -70 47 56.4 -lat -30 42 46.8 -alt 2200"
        );
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert_eq!(
            Location::preset("mauna-kea"),
            Err(SiteError::UnknownPreset("mauna-kea".to_string()))
        );
    }

    #[test]
    fn preset_without_coordinates_cannot_feed_driver() {
        let loc = Location::preset("erau").unwrap();
        assert_eq!(
            loc.driver_coordinates(),
            Err(SiteError::MissingCoordinates("erau"))
        );
    }

    #[test]
    fn explicit_location_renders_sexagesimal_arguments() {
        let loc = Location::explicit(-30.7130, -70.7990, 2200.0);
        assert_eq!(
            loc.shadow_args().join(" "),
            "-lon -70 47 56.4 -lat -30 42 46.8 -alt 2200"
        );
        assert_eq!(loc.driver_coordinates().unwrap(), (-30.7130, -70.7990));
    }

    #[test]
    fn sexagesimal_carries_rounded_seconds() {
        assert_eq!(to_sexagesimal(10.999999), "11 0 0.0");
        assert_eq!(to_sexagesimal(0.5), "0 30 0.0");
    }

    #[test]
    fn preset_names_include_all_sites() {
        let mut names: Vec<_> = preset_names().collect();
        names.sort_unstable();
        assert_eq!(names, ["ctio", "erau", "kpno", "pbo", "wiyn"]);
    }
}
