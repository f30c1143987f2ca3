//! Download precheck against the free space of the destination volume.

use std::io::{self, Read};
use std::path::Path;

use tempfile::tempdir;

use share_transfer::local::{LocalEntry, LocalWalk};
use share_transfer::{
    DirectoryHandle, LocalFs, MemoryShare, RemotePath, Result, ShareError, StdFs, TransferEngine,
    TransferOptions, Want,
};

// `walk` borrows its receiver for the lifetime of the iterator
static REAL: StdFs = StdFs;

/// Real filesystem with a configurable free-space report.
struct TinyDisk {
    free: io::Result<u64>,
}

impl LocalFs for TinyDisk {
    fn exists(&self, path: &Path) -> bool {
        StdFs.exists(path)
    }
    fn is_dir(&self, path: &Path) -> bool {
        StdFs.is_dir(path)
    }
    fn is_file(&self, path: &Path) -> bool {
        StdFs.is_file(path)
    }
    fn list_children(&self, path: &Path) -> Result<Vec<LocalEntry>> {
        StdFs.list_children(path)
    }
    fn file_size(&self, path: &Path) -> Result<u64> {
        StdFs.file_size(path)
    }
    fn create_dirs(&self, path: &Path) -> Result<()> {
        StdFs.create_dirs(path)
    }
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read>> {
        StdFs.open_read(path)
    }
    fn replace_from_reader(&self, path: &Path, reader: &mut dyn Read, expected: Option<u64>) -> Result<u64> {
        StdFs.replace_from_reader(path, reader, expected)
    }
    fn walk<'a>(&'a self, root: &Path, recurse: bool, want: Want) -> LocalWalk<'a> {
        REAL.walk(root, recurse, want)
    }
    fn available_space(&self, _path: &Path) -> io::Result<u64> {
        match &self.free {
            Ok(n) => Ok(*n),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        }
    }
}

fn share() -> MemoryShare {
    let share = MemoryShare::new("space");
    share.seed_file(&RemotePath::parse("data/blob.bin"), &[7u8; 64]).unwrap();
    share
}

#[test]
fn insufficient_space_fails_before_writing() {
    let td = tempdir().unwrap();
    let dest = td.path().join("out");
    let share = share();
    let disk = TinyDisk { free: Ok(1024) };
    let err = TransferEngine::new(&share, &disk)
        .download_directory(&DirectoryHandle::new(RemotePath::parse("data")), &dest, &TransferOptions::default())
        .unwrap_err();
    assert!(matches!(err, ShareError::InsufficientSpace { required: 64, available: 1024, .. }));
    assert!(!dest.exists());
}

#[test]
fn failed_probe_does_not_block_download() {
    let td = tempdir().unwrap();
    let dest = td.path().join("out");
    let share = share();
    let disk = TinyDisk {
        free: Err(io::Error::new(io::ErrorKind::Unsupported, "statvfs unavailable")),
    };
    TransferEngine::new(&share, &disk)
        .download_directory(&DirectoryHandle::new(RemotePath::parse("data")), &dest, &TransferOptions::default())
        .expect("download");
    assert_eq!(std::fs::read(dest.join("blob.bin")).unwrap(), vec![7u8; 64]);
}
