use super::error::EngineError;
use crate::core::io::atomic::copy_atomic;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    Am,
    Pm,
}

impl Period {
    pub const BOTH: [Period; 2] = [Period::Am, Period::Pm];

    pub fn label(self) -> &'static str {
        match self {
            Period::Am => "AM",
            Period::Pm => "PM",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies one run of the sweep grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunKey {
    pub day_of_year: u32,
    pub f107: f64,
    pub period: Period,
}

impl RunKey {
    /// The flux as it appears in paths: truncated to an integer.
    pub fn flux_label(&self) -> i64 {
        self.f107.trunc() as i64
    }

    /// Prefix put in front of every archived file name, e.g.
    /// `doy-34_AM_f107-70_`.
    pub fn file_prefix(&self) -> String {
        format!(
            "doy-{}_{}_f107-{}_",
            self.day_of_year,
            self.period,
            self.flux_label()
        )
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.file_prefix();
        f.write_str(prefix.trim_end_matches('_'))
    }
}

/// Directory tree holding the inputs and outputs of every completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    root: PathBuf,
}

impl Archive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/DOY_<d>/f107_<f>/<AM|PM>`. Depends only on the key.
    pub fn run_dir(&self, key: &RunKey) -> PathBuf {
        self.root
            .join(format!("DOY_{}", key.day_of_year))
            .join(format!("f107_{}", key.flux_label()))
            .join(key.period.label())
    }

    pub fn artifact_path(&self, key: &RunKey, artifact: &str) -> PathBuf {
        self.run_dir(key)
            .join(format!("{}{}", key.file_prefix(), artifact))
    }

    /// Creates the run directory. Existing directories are left alone.
    pub fn prepare(&self, key: &RunKey) -> Result<PathBuf, EngineError> {
        let dir = self.run_dir(key);
        std::fs::create_dir_all(&dir).map_err(EngineError::io(&dir))?;
        Ok(dir)
    }

    /// Copies `file` into the run directory under its prefixed name,
    /// replacing any earlier copy atomically.
    pub fn store(&self, key: &RunKey, file: &Path) -> Result<PathBuf, EngineError> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| EngineError::MissingArtifact {
                path: file.to_path_buf(),
            })?;
        let target = self.artifact_path(key, &name);
        copy_atomic(file, &target).map_err(EngineError::io(file))?;
        debug!(from = %file.display(), to = %target.display(), "Archived run file");
        Ok(target)
    }
}
