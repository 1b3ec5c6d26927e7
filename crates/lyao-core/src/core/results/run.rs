use super::error::ResultParseError;
use super::infile::InfileEcho;
use super::los::LosSeries;
use super::source::SourceProfile;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// What to do when more than one file in a run directory matches a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    #[default]
    Error,
    /// Keep the last match in file-name order and log a warning.
    LastWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Infile,
    Source,
    Los,
}

impl Role {
    const ALL: [Role; 3] = [Role::Infile, Role::Source, Role::Los];

    fn name(self) -> &'static str {
        match self {
            Role::Infile => "driver echo (infile/inputs.rt)",
            Role::Source => "source (alpha)",
            Role::Los => "line-of-sight (hab_los)",
        }
    }

    fn matches(self, file_name: &str) -> bool {
        match self {
            Role::Infile => file_name.contains("infile") || file_name.contains("inputs.rt"),
            Role::Source => file_name.contains("alpha"),
            Role::Los => file_name.contains("hab_los"),
        }
    }
}

/// Paths of the three artifacts that make up a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFiles {
    pub infile: PathBuf,
    pub source: PathBuf,
    pub los: PathBuf,
}

impl RunFiles {
    /// Walks `dir` recursively in file-name order and assigns each file to
    /// the roles its name matches.
    pub fn locate(dir: &Path, policy: DuplicatePolicy) -> Result<Self, ResultParseError> {
        let mut slots: [Option<PathBuf>; 3] = [None, None, None];

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|source| ResultParseError::Walk {
                dir: dir.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            for (slot, role) in slots.iter_mut().zip(Role::ALL) {
                if !role.matches(&name) {
                    continue;
                }
                if let Some(previous) = slot.as_ref() {
                    match policy {
                        DuplicatePolicy::Error => {
                            return Err(ResultParseError::AmbiguousArtifact {
                                role: role.name(),
                                dir: dir.to_path_buf(),
                                first: previous.clone(),
                                second: entry.path().to_path_buf(),
                            });
                        }
                        DuplicatePolicy::LastWins => warn!(
                            role = role.name(),
                            replaced = %previous.display(),
                            kept = %entry.path().display(),
                            "Duplicate run artifact, keeping the later file"
                        ),
                    }
                }
                *slot = Some(entry.path().to_path_buf());
            }
        }

        let [infile, source, los] = slots;
        let take = |slot: Option<PathBuf>, role: Role| {
            slot.ok_or_else(|| ResultParseError::MissingArtifact {
                role: role.name(),
                dir: dir.to_path_buf(),
            })
        };
        Ok(Self {
            infile: take(infile, Role::Infile)?,
            source: take(source, Role::Source)?,
            los: take(los, Role::Los)?,
        })
    }
}

/// Everything recovered from one archived run directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub files: RunFiles,
    pub infile: InfileEcho,
    pub source: SourceProfile,
    pub los: LosSeries,
}

impl RunResult {
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ResultParseError> {
        Self::load_with(dir, DuplicatePolicy::default())
    }

    pub fn load_with<P: AsRef<Path>>(
        dir: P,
        policy: DuplicatePolicy,
    ) -> Result<Self, ResultParseError> {
        let files = RunFiles::locate(dir.as_ref(), policy)?;
        debug!(infile = %files.infile.display(), source = %files.source.display(), los = %files.los.display(), "Located run artifacts");
        Ok(Self {
            infile: InfileEcho::from_path(&files.infile)?,
            source: SourceProfile::from_path(&files.source)?,
            los: LosSeries::from_path(&files.los)?,
            files,
        })
    }
}
