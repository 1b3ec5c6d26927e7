use super::atomic;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A text input consumed by one of the external executables.
///
/// Implementors only describe how to serialize themselves; the default
/// methods handle placing the file on disk. Every file is written atomically,
/// so an executable started right after never sees a half-written input.
pub trait InputFile {
    /// The name the consuming executable expects inside its working directory.
    const FILE_NAME: &'static str;

    /// Writes the file contents to a writer.
    ///
    /// # Arguments
    ///
    /// * `writer` - The writer to output to.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(&self, writer: &mut dyn Write) -> io::Result<()>;

    /// Renders the file contents into a string.
    fn render(&self) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Atomically writes the file to an explicit path.
    fn write_to_path<P: AsRef<Path>>(&self, path: P) -> io::Result<()>
    where
        Self: Sized,
    {
        atomic::write_atomic_with(path.as_ref(), |writer| self.write_to(writer))
    }

    /// Atomically writes the file as `dir/FILE_NAME` and returns that path.
    fn write_into_dir<P: AsRef<Path>>(&self, dir: P) -> io::Result<PathBuf>
    where
        Self: Sized,
    {
        let path = dir.as_ref().join(Self::FILE_NAME);
        self.write_to_path(&path)?;
        Ok(path)
    }
}
