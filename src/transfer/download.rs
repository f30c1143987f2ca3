use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use super::{TransferEngine, TransferOptions, TransferStats, check_size_limit};
use crate::errors::{Result, ShareError};
use crate::handle::{DirectoryHandle, FileHandle};
use crate::local::{LocalFs, ensure_space_for};
use crate::mapping::PathMapping;
use crate::remote_path::RemotePath;
use crate::store::{ObjectKind, RemoteStore};
use crate::walk::{RemoteEntry, Want, list_entries};

impl<'a, S: RemoteStore + ?Sized, L: LocalFs + ?Sized> TransferEngine<'a, S, L> {
    fn require_remote_file(&self, path: &RemotePath) -> Result<()> {
        match self.store.kind(path)? {
            Some(ObjectKind::File) => Ok(()),
            Some(ObjectKind::Directory) => Err(ShareError::WrongObjectKind {
                path: path.to_string(),
                expected: "file",
            }),
            None => Err(ShareError::RemotePathNotFound(path.to_string())),
        }
    }

    /// Download `file` to `dest`. The destination is replaced in one step;
    /// readers never observe a half-written file. Returns bytes written.
    pub fn download_to_path(&self, file: &FileHandle, dest: &Path, opts: &TransferOptions) -> Result<u64> {
        self.require_remote_file(file.path())?;

        if self.local.is_dir(dest) {
            return Err(ShareError::invalid_path(
                dest.display().to_string(),
                "destination is a directory",
            ));
        }
        if self.local.exists(dest) && !opts.allow_overwrite {
            return Err(ShareError::OverwriteNotAllowed(dest.display().to_string()));
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty())
            && !self.local.is_dir(parent)
        {
            if opts.create_parent_dirs {
                self.local.create_dirs(parent)?;
            } else {
                return Err(ShareError::LocalPathNotFound(parent.to_path_buf()));
            }
        }

        let length = self.store.get_length(file.path())?;
        self.fetch(file.path(), dest, length)
    }

    /// Stream `path` into `dest`. A stream that does not yield exactly
    /// `length` bytes leaves `dest` as it was.
    fn fetch(&self, path: &RemotePath, dest: &Path, length: u64) -> Result<u64> {
        // one extra byte so an over-long stream is detected
        let mut reader = self.store.read_all(path)?.take(length.saturating_add(1));
        let written = self
            .local
            .replace_from_reader(dest, &mut reader, Some(length))
            .map_err(|e| match e {
                ShareError::LengthMismatch { expected, actual, .. } => ShareError::LengthMismatch {
                    path: path.to_string(),
                    expected,
                    actual,
                },
                other => other,
            })?;
        debug!(path = %path, dest = %dest.display(), bytes = written, "downloaded file");
        Ok(written)
    }

    /// Read a whole remote file into memory.
    pub fn download_to_vec(&self, file: &FileHandle) -> Result<Vec<u8>> {
        let path = file.path();
        self.require_remote_file(path)?;
        let length = self.store.get_length(path)?;
        let capacity = usize::try_from(length).map_err(|_| {
            ShareError::invalid_path(path.to_string(), "file is too large to buffer in memory")
        })?;

        let mut buf = Vec::with_capacity(capacity);
        let reader = self.store.read_all(path)?;
        // one extra byte so an over-long stream is detected
        reader
            .take(length.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|source| ShareError::RemoteRead {
                path: path.to_string(),
                source,
            })?;
        if buf.len() as u64 != length {
            return Err(ShareError::LengthMismatch {
                path: path.to_string(),
                expected: length,
                actual: buf.len() as u64,
            });
        }
        Ok(buf)
    }

    /// Copy the remote tree under `remote_dir` into `local_dir`.
    ///
    /// Sizes come from the store and are checked against `max_total_bytes`
    /// and the free space of the destination volume before any local file is
    /// written. Existing local files are replaced.
    pub fn download_directory(
        &self,
        remote_dir: &DirectoryHandle,
        local_dir: &Path,
        opts: &TransferOptions,
    ) -> Result<TransferStats> {
        if self.store.kind(remote_dir.path())? != Some(ObjectKind::Directory) {
            return Err(ShareError::RemotePathNotFound(remote_dir.path().to_string()));
        }

        let mut plan: Vec<(RemoteEntry, u64)> = Vec::new();
        let mut total = 0u64;
        for entry in list_entries(self.store, remote_dir, opts.recurse, Want::Both) {
            let entry = entry?;
            let size = match &entry {
                RemoteEntry::File(f) => self.store.get_length(f.path())?,
                RemoteEntry::Directory(_) => 0,
            };
            total = total.saturating_add(size);
            plan.push((entry, size));
        }
        check_size_limit(total, opts.max_total_bytes)?;
        ensure_space_for(self.local, local_dir, total)?;

        let mut stats = TransferStats::default();
        if !self.local.is_dir(local_dir) {
            self.local.create_dirs(local_dir)?;
            stats.directories_created += 1;
        }

        let mapping = PathMapping::new(remote_dir.path().clone(), local_dir);
        for (entry, size) in &plan {
            let dest = mapping.to_local(entry.path())?;
            match entry {
                RemoteEntry::Directory(_) => {
                    if !self.local.is_dir(&dest) {
                        self.local.create_dirs(&dest)?;
                        stats.directories_created += 1;
                    }
                }
                RemoteEntry::File(f) => {
                    let written = self.fetch(f.path(), &dest, *size)?;
                    stats.files += 1;
                    stats.bytes += written;
                }
            }
        }

        info!(
            source = %remote_dir.path(),
            dest = %local_dir.display(),
            files = stats.files,
            bytes = stats.bytes,
            dirs_created = stats.directories_created,
            "directory download complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::StdFs;
    use crate::store::MemoryShare;
    use tempfile::tempdir;

    fn file(p: &str) -> FileHandle {
        FileHandle::new(RemotePath::parse(p))
    }

    #[test]
    fn download_to_vec_returns_content() {
        let share = MemoryShare::new("d");
        share.seed_file(&RemotePath::parse("x/y.txt"), b"hello").unwrap();
        let engine = TransferEngine::new(&share, &StdFs);
        assert_eq!(engine.download_to_vec(&file("x/y.txt")).unwrap(), b"hello");
    }

    #[test]
    fn download_of_directory_is_wrong_kind() {
        let share = MemoryShare::new("d");
        share.seed_file(&RemotePath::parse("x/y.txt"), b"hello").unwrap();
        let engine = TransferEngine::new(&share, &StdFs);
        let err = engine.download_to_vec(&file("x")).unwrap_err();
        assert!(matches!(err, ShareError::WrongObjectKind { .. }));
    }

    #[test]
    fn download_to_path_creates_parents() {
        let td = tempdir().unwrap();
        let share = MemoryShare::new("d");
        share.seed_file(&RemotePath::parse("r.txt"), b"remote").unwrap();
        let engine = TransferEngine::new(&share, &StdFs);
        let dest = td.path().join("deep/er/r.txt");
        let n = engine
            .download_to_path(&file("r.txt"), &dest, &TransferOptions::default())
            .unwrap();
        assert_eq!(n, 6);
        assert_eq!(std::fs::read(&dest).unwrap(), b"remote");
    }

    #[test]
    fn download_refuses_existing_without_overwrite() {
        let td = tempdir().unwrap();
        let dest = td.path().join("r.txt");
        std::fs::write(&dest, b"local").unwrap();
        let share = MemoryShare::new("d");
        share.seed_file(&RemotePath::parse("r.txt"), b"remote").unwrap();
        let engine = TransferEngine::new(&share, &StdFs);
        let opts = TransferOptions::default().with_allow_overwrite(false);
        let err = engine.download_to_path(&file("r.txt"), &dest, &opts).unwrap_err();
        assert!(matches!(err, ShareError::OverwriteNotAllowed(_)));
        assert_eq!(std::fs::read(&dest).unwrap(), b"local");
    }

    #[test]
    fn short_remote_stream_keeps_local_file() {
        let td = tempdir().unwrap();
        let dest = td.path().join("r.txt");
        std::fs::write(&dest, b"good local copy").unwrap();
        let share = MemoryShare::new("d");
        let remote = RemotePath::parse("r.txt");
        share.seed_file(&remote, b"remote-content").unwrap();
        share.truncate_reads_of(&remote, 3);
        let engine = TransferEngine::new(&share, &StdFs);

        let err = engine
            .download_to_path(&file("r.txt"), &dest, &TransferOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ShareError::LengthMismatch { ref path, expected: 14, actual: 3 } if path == "r.txt"
        ));
        assert_eq!(std::fs::read(&dest).unwrap(), b"good local copy");
        assert_eq!(std::fs::read_dir(td.path()).unwrap().count(), 1);
    }

    #[test]
    fn broken_remote_stream_is_a_remote_error() {
        let share = MemoryShare::new("d");
        let remote = RemotePath::parse("x/y.txt");
        share.seed_file(&remote, b"hello").unwrap();
        share.fail_reads_of(&remote);
        let engine = TransferEngine::new(&share, &StdFs);
        let err = engine.download_to_vec(&file("x/y.txt")).unwrap_err();
        assert!(matches!(err, ShareError::RemoteRead { ref path, .. } if path == "x/y.txt"));
    }

    #[test]
    fn missing_remote_file_is_not_found() {
        let td = tempdir().unwrap();
        let share = MemoryShare::new("d");
        let engine = TransferEngine::new(&share, &StdFs);
        let err = engine
            .download_to_path(&file("ghost"), &td.path().join("g"), &TransferOptions::default())
            .unwrap_err();
        assert!(matches!(err, ShareError::RemotePathNotFound(_)));
    }
}
