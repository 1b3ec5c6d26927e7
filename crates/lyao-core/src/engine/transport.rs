use super::command::{CommandRunner, ExternalCommand};
use super::error::EngineError;
use crate::core::geometry::GeometryRecord;
use crate::core::io::driver::RunParameters;
use crate::core::io::los_input::{LosHeader, LosInput};
use crate::core::io::traits::InputFile;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_PROGRAM: &str = "testscript";
pub const SOURCE_FILE: &str = "H_alpha.source";
pub const LOS_OUTPUT_FILE: &str = "hab_los.dat";

/// Input files staged in the transport working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInputs {
    pub los_input: PathBuf,
    pub driver: PathBuf,
}

/// Output files the transport run left in its working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOutputs {
    pub source: PathBuf,
    pub los: PathBuf,
}

/// The transport executable. It takes no arguments and exchanges every file
/// through its working directory, so only one run may use a directory at a
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportExecutable {
    pub dir: PathBuf,
    pub program: PathBuf,
}

impl TransportExecutable {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            program: PathBuf::from(DEFAULT_PROGRAM),
        }
    }

    pub fn program_path(&self) -> PathBuf {
        if self.program.is_absolute() {
            self.program.clone()
        } else {
            self.dir.join(&self.program)
        }
    }

    pub fn outputs(&self) -> TransportOutputs {
        TransportOutputs {
            source: self.dir.join(SOURCE_FILE),
            los: self.dir.join(LOS_OUTPUT_FILE),
        }
    }

    /// Writes `inputs_los.dat` and `infile.dat` into the working directory.
    pub fn stage(
        &self,
        records: &[GeometryRecord],
        header: LosHeader,
        params: &RunParameters,
    ) -> Result<StagedInputs, EngineError> {
        let los_input = LosInput::new(records, header)
            .write_into_dir(&self.dir)
            .map_err(EngineError::io(self.dir.join(LosInput::FILE_NAME)))?;
        let driver = params
            .write_into_dir(&self.dir)
            .map_err(EngineError::io(self.dir.join(RunParameters::FILE_NAME)))?;
        debug!(los_input = %los_input.display(), driver = %driver.display(), "Staged transport inputs");
        Ok(StagedInputs { los_input, driver })
    }

    /// Runs the program in its directory and checks that both outputs exist.
    /// Outputs left over from a previous run are removed first.
    pub fn run(&self, runner: &mut dyn CommandRunner) -> Result<TransportOutputs, EngineError> {
        let outputs = self.outputs();
        remove_stale(&outputs.source)?;
        remove_stale(&outputs.los)?;

        let command = ExternalCommand::new(self.program_path()).current_dir(&self.dir);
        runner.run(&command)?.ensure_success(&command)?;

        for path in [&outputs.source, &outputs.los] {
            if !path.is_file() {
                return Err(EngineError::MissingArtifact { path: path.clone() });
            }
        }
        Ok(outputs)
    }
}

fn remove_stale(path: &Path) -> Result<(), EngineError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
