use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn temp_beside(path: &Path) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir)
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory, so readers never observe a partially written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp = temp_beside(path)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Streams a file into the temporary file via `fill`, then moves it into place.
pub fn write_atomic_with<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let mut tmp = temp_beside(path)?;
    {
        let mut writer = io::BufWriter::new(tmp.as_file_mut());
        fill(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn copy_atomic(from: &Path, to: &Path) -> io::Result<u64> {
    let mut source = std::fs::File::open(from)?;
    let mut tmp = temp_beside(to)?;
    let copied = io::copy(&mut source, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(to).map_err(|e| e.error)?;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_replaces_existing_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old contents that are longer").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn write_atomic_with_streams_into_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("streamed.txt");
        write_atomic_with(&path, |w| writeln!(w, "line {}", 1)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line 1\n");
    }

    #[test]
    fn failed_fill_leaves_target_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kept.txt");
        std::fs::write(&path, "kept").unwrap();
        let result = write_atomic_with(&path, |w| {
            w.write_all(b"partial")?;
            Err(io::Error::other("boom"))
        });
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn copy_atomic_duplicates_bytes() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("a.dat");
        let to = dir.path().join("b.dat");
        std::fs::write(&from, "payload\n").unwrap();
        assert_eq!(copy_atomic(&from, &to).unwrap(), 8);
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "payload\n");
    }

    #[test]
    fn copy_atomic_of_missing_source_fails() {
        let dir = tempdir().unwrap();
        let result = copy_atomic(&dir.path().join("missing"), &dir.path().join("to"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(!dir.path().join("to").exists());
    }
}
