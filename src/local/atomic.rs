//! Temp-file-then-rename replacement.
//! - Streams into a uniquely named temp file next to the destination.
//! - Checks the byte count against an expected length, when given, before the rename.
//! - Flushes and fsyncs before the rename.
//! - On Windows, removes an existing destination first (rename doesn't overwrite).
//! - On Unix, best-effort fsync of the destination directory after rename.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::trace;

use super::helpers::io_error_with_help;
use crate::errors::{Result, ShareError};

const BUF_SIZE: usize = 1024 * 1024;

fn unique_temp_path(dst_dir: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    dst_dir.join(format!(".share_transfer.{pid}.{nanos}.tmp"))
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn stream_to_new_file(reader: &mut dyn Read, tmp: &Path) -> io::Result<u64> {
    let file = OpenOptions::new().write(true).create_new(true).open(tmp)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, file);
    let bytes = io::copy(reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(bytes)
}

fn rename_over(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        if let Err(e) = fs::remove_file(dst) {
            if e.kind() != io::ErrorKind::NotFound {
                return Err(e);
            }
        }
    }
    fs::rename(src, dst)?;
    if let Some(parent) = dst.parent() {
        // the rename already succeeded
        let _ = fsync_dir(parent);
    }
    Ok(())
}

/// Replace `dest` with everything `reader` yields. Callers never observe a
/// partially written `dest`; the temp file is removed on any failure.
///
/// With `expected` set, a stream of any other length fails with
/// `LengthMismatch` and `dest` is left untouched.
pub(crate) fn replace_from_reader(dest: &Path, reader: &mut dyn Read, expected: Option<u64>) -> Result<u64> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = unique_temp_path(dir);

    let bytes = match stream_to_new_file(reader, &tmp) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            return Err(io_error_with_help("write temporary file", &tmp)(e));
        }
    };

    if let Some(expected) = expected
        && bytes != expected
    {
        let _ = fs::remove_file(&tmp);
        return Err(ShareError::LengthMismatch {
            path: dest.display().to_string(),
            expected,
            actual: bytes,
        });
    }

    if let Err(e) = rename_over(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(io_error_with_help("rename temporary file into place", dest)(e));
    }
    trace!(dest = %dest.display(), bytes, "replaced local file");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn replaces_existing_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.txt");
        fs::write(&dest, b"old contents that are longer").unwrap();

        let n = replace_from_reader(&dest, &mut Cursor::new(b"new".to_vec()), Some(3)).unwrap();
        assert_eq!(n, 3);
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("a.bin");
        replace_from_reader(&dest, &mut Cursor::new(vec![7u8; 10]), None).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.bin")]);
    }

    struct FailingReader;
    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("boom"))
        }
    }

    #[test]
    fn failed_stream_keeps_old_destination() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("keep.txt");
        fs::write(&dest, b"keep").unwrap();

        assert!(replace_from_reader(&dest, &mut FailingReader, None).is_err());
        assert_eq!(fs::read(&dest).unwrap(), b"keep");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn short_stream_keeps_old_destination() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("keep.txt");
        fs::write(&dest, b"good local copy").unwrap();

        let err = replace_from_reader(&dest, &mut Cursor::new(b"rem".to_vec()), Some(14)).unwrap_err();
        assert!(matches!(err, ShareError::LengthMismatch { expected: 14, actual: 3, .. }));
        assert_eq!(fs::read(&dest).unwrap(), b"good local copy");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
