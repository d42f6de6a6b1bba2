//! All-or-nothing file output.
//!
//! Files are written to a temporary sibling and renamed onto the target only
//! after the last byte is flushed, so a failed write never leaves a truncated
//! artifact behind.

use std::io::BufWriter;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{Result, WavecarveError};

/// Creates `path` from whatever `write` produces.
///
/// On error the temporary file is removed and an existing file at `path` is
/// left as it was.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<NamedTempFile>) -> Result<()>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file = NamedTempFile::new_in(dir)
        .map_err(|e| WavecarveError::io(format!("create {}", path.display()), e))?;

    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    let file = writer
        .into_inner()
        .map_err(|e| WavecarveError::io(format!("flush {}", path.display()), e.into_error()))?;

    file.persist(path)
        .map_err(|e| WavecarveError::io(format!("rename onto {}", path.display()), e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::*;

    fn failing_write(w: &mut BufWriter<NamedTempFile>) -> Result<()> {
        w.write_all(&[7; 10_000])
            .map_err(|e| WavecarveError::io("write", e))?;
        Err(WavecarveError::io(
            "write",
            io::Error::new(io::ErrorKind::Other, "No space left on device"),
        ))
    }

    #[test]
    fn writes_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_atomically(&path, |w| {
            w.write_all(b"hello").map_err(|e| WavecarveError::io("write", e))
        })
        .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let err = write_atomically(&path, failing_write).unwrap_err();
        assert!(matches!(err, WavecarveError::Io { .. }));
        assert!(!path.exists());
        // The temporary sibling is cleaned up as well
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"previous").unwrap();

        assert!(write_atomically(&path, failing_write).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"previous");
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = write_atomically(Path::new("/nonexistent/dir/out.bin"), |_| Ok(())).unwrap_err();
        assert!(matches!(err, WavecarveError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/dir/out.bin"));
    }
}
