use std::io::{self, Read};
use std::path::Path;

use tracing::{debug, info, trace};

use super::chunk::{needs_chunking, plan_chunks};
use super::{TransferEngine, TransferOptions, TransferStats, check_size_limit};
use crate::ensure::DirectoryEnsurer;
use crate::errors::{Result, ShareError};
use crate::handle::{DirectoryHandle, FileHandle};
use crate::local::{LocalEntry, LocalFs};
use crate::mapping::PathMapping;
use crate::remote_path::RemotePath;
use crate::store::{ObjectKind, RemoteStore};
use crate::walk::Want;

fn source_error(path: &RemotePath, e: io::Error) -> ShareError {
    ShareError::LocalIo {
        message: format!("read upload source for {path}: {e}"),
        source: e,
    }
}

/// Fill `buf` from `reader`, stopping early only at end of stream.
fn read_full(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl<'a, S: RemoteStore + ?Sized, L: LocalFs + ?Sized> TransferEngine<'a, S, L> {
    /// Upload `length` bytes from `reader` to `file`. Returns bytes written.
    ///
    /// The destination is declared at `length` up front, then filled with one
    /// write (below the chunk threshold) or a series of range writes. A stream
    /// that ends early fails with `LengthMismatch`.
    pub fn upload_stream(
        &self,
        file: &FileHandle,
        reader: &mut dyn Read,
        length: u64,
        opts: &TransferOptions,
    ) -> Result<u64> {
        let mut ensurer = DirectoryEnsurer::new(self.store);
        self.upload_with(&mut ensurer, file, reader, length, opts)
    }

    pub fn upload_bytes(&self, file: &FileHandle, data: &[u8], opts: &TransferOptions) -> Result<u64> {
        let mut reader = data;
        self.upload_stream(file, &mut reader, data.len() as u64, opts)
    }

    /// Upload one local file, sized from the local filesystem.
    pub fn upload_local_file(&self, source: &Path, file: &FileHandle, opts: &TransferOptions) -> Result<u64> {
        if !self.local.is_file(source) {
            return Err(ShareError::LocalPathNotFound(source.to_path_buf()));
        }
        let length = self.local.file_size(source)?;
        let mut reader = self.local.open_read(source)?;
        self.upload_stream(file, &mut *reader, length, opts)
    }

    /// Copy a local directory tree to `remote_dir`.
    ///
    /// The summed size of the files is checked against `max_total_bytes`
    /// before anything is created. Member files always replace existing
    /// remote files; missing remote directories are created as they are met.
    pub fn upload_directory(
        &self,
        local_dir: &Path,
        remote_dir: &DirectoryHandle,
        opts: &TransferOptions,
    ) -> Result<TransferStats> {
        if !self.local.is_dir(local_dir) {
            return Err(ShareError::LocalPathNotFound(local_dir.to_path_buf()));
        }

        let entries: Vec<LocalEntry> = self
            .local
            .walk(local_dir, opts.recurse, Want::Both)
            .collect::<Result<_>>()?;
        let total: u64 = entries.iter().filter(|e| !e.is_dir).map(|e| e.size).sum();
        check_size_limit(total, opts.max_total_bytes)?;

        let mapping = PathMapping::new(remote_dir.path().clone(), local_dir);
        let mut ensurer = DirectoryEnsurer::new(self.store);
        ensurer.ensure(remote_dir.path())?;

        let member_opts = opts.for_tree_member();
        let mut stats = TransferStats::default();
        for entry in &entries {
            let remote = mapping.to_remote(&entry.path)?;
            if entry.is_dir {
                ensurer.ensure(&remote)?;
                continue;
            }
            let mut reader = self.local.open_read(&entry.path)?;
            let written = self.upload_with(
                &mut ensurer,
                &FileHandle::new(remote),
                &mut *reader,
                entry.size,
                &member_opts,
            )?;
            stats.files += 1;
            stats.bytes += written;
        }
        stats.directories_created = ensurer.created();

        info!(
            source = %local_dir.display(),
            dest = %remote_dir.path(),
            files = stats.files,
            bytes = stats.bytes,
            dirs_created = stats.directories_created,
            "directory upload complete"
        );
        Ok(stats)
    }

    pub(super) fn upload_with(
        &self,
        ensurer: &mut DirectoryEnsurer<'a, S>,
        file: &FileHandle,
        reader: &mut dyn Read,
        length: u64,
        opts: &TransferOptions,
    ) -> Result<u64> {
        let path = file.path();
        if path.is_root() {
            return Err(ShareError::invalid_path("/", "the share root cannot be written as a file"));
        }

        match self.store.kind(path)? {
            Some(ObjectKind::Directory) => {
                return Err(ShareError::WrongObjectKind {
                    path: path.to_string(),
                    expected: "file",
                });
            }
            Some(ObjectKind::File) if !opts.allow_overwrite => {
                return Err(ShareError::OverwriteNotAllowed(path.to_string()));
            }
            _ => {}
        }

        let parent = file.directory();
        if opts.create_parent_dirs {
            ensurer.ensure(parent.path())?;
        } else if !parent.path().is_root() && self.store.kind(parent.path())? != Some(ObjectKind::Directory) {
            return Err(ShareError::RemotePathNotFound(parent.path().to_string()));
        }

        self.store.create_file(path, length)?;
        let mut limited = reader.take(length);
        if needs_chunking(length, self.chunk_size) {
            self.write_chunked(path, &mut limited, length)?;
        } else {
            self.write_single(path, &mut limited, length)?;
        }

        debug!(path = %path, bytes = length, "uploaded file");
        Ok(length)
    }

    fn write_single(&self, path: &RemotePath, reader: &mut dyn Read, length: u64) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        let mut buf = Vec::with_capacity(length as usize);
        reader.read_to_end(&mut buf).map_err(|e| source_error(path, e))?;
        if buf.len() as u64 != length {
            return Err(ShareError::LengthMismatch {
                path: path.to_string(),
                expected: length,
                actual: buf.len() as u64,
            });
        }
        self.store.write_range(path, 0, &buf)?;
        Ok(())
    }

    fn write_chunked(&self, path: &RemotePath, reader: &mut dyn Read, length: u64) -> Result<()> {
        let chunks = plan_chunks(length, self.chunk_size);
        let mut buf = vec![0u8; self.chunk_size as usize];
        for chunk in &chunks {
            let slice = &mut buf[..chunk.length as usize];
            let n = read_full(reader, slice).map_err(|e| source_error(path, e))?;
            if n as u64 != chunk.length {
                return Err(ShareError::LengthMismatch {
                    path: path.to_string(),
                    expected: length,
                    actual: chunk.offset + n as u64,
                });
            }
            self.store.write_range(path, chunk.offset, slice)?;
            trace!(path = %path, index = chunk.index, offset = chunk.offset, len = chunk.length, "wrote chunk");
        }
        debug!(path = %path, chunks = chunks.len(), "chunked upload finished");
        Ok(())
    }
}
