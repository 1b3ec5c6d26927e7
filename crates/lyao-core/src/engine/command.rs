use super::error::EngineError;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// A fully specified invocation of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub status_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Turns a non-zero exit into [`EngineError::ProcessFailed`].
    pub fn ensure_success(self, command: &ExternalCommand) -> Result<Self, EngineError> {
        if self.success {
            Ok(self)
        } else {
            Err(EngineError::ProcessFailed {
                program: command.program.clone(),
                code: self.status_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs external programs to completion. The sweep only talks to the
/// executables through this trait, so tests can script their behavior.
pub trait CommandRunner {
    fn run(&mut self, command: &ExternalCommand) -> Result<CommandOutput, EngineError>;
}

/// Blocking runner backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &ExternalCommand) -> Result<CommandOutput, EngineError> {
        debug!(command = %command, cwd = ?command.current_dir, "Running external command");
        let mut process = Command::new(&command.program);
        process.args(&command.args);
        if let Some(dir) = &command.current_dir {
            process.current_dir(dir);
        }
        let output = process.output().map_err(|source| EngineError::Launch {
            program: command.program.clone(),
            source,
        })?;
        Ok(CommandOutput {
            status_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
