//! Local filesystem capability.
//!
//! `LocalFs` is what the transfer engine needs from the local side; `StdFs`
//! implements it over `std::fs` and `walkdir`.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::Result;
use crate::walk::Want;

mod atomic;
pub mod helpers;
pub mod space;

pub use helpers::io_error_with_help;
pub use space::{ensure_space_for, format_bytes};

/// A file or directory found on the local side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    /// File size in bytes; 0 for directories.
    pub size: u64,
}

pub type LocalWalk<'a> = Box<dyn Iterator<Item = Result<LocalEntry>> + 'a>;

pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Immediate children of a directory, sorted by name.
    fn list_children(&self, path: &Path) -> Result<Vec<LocalEntry>>;

    fn file_size(&self, path: &Path) -> Result<u64>;

    /// Create `path` and any missing parents.
    fn create_dirs(&self, path: &Path) -> Result<()>;

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read>>;

    /// Write everything from `reader` to `path`, replacing any existing file
    /// in one step as seen by other readers. Returns bytes written.
    ///
    /// When `expected` is set and the stream length differs, nothing is
    /// replaced and the call fails with `LengthMismatch`.
    fn replace_from_reader(&self, path: &Path, reader: &mut dyn Read, expected: Option<u64>) -> Result<u64>;

    /// Pre-order walk below `root` (excluding `root`), optionally recursive.
    fn walk<'a>(&'a self, root: &Path, recurse: bool, want: Want) -> LocalWalk<'a>;

    /// Bytes available to this process on the volume holding `path`.
    fn available_space(&self, path: &Path) -> io::Result<u64>;
}

/// `LocalFs` over the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl LocalFs for StdFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_children(&self, path: &Path) -> Result<Vec<LocalEntry>> {
        self.walk(path, false, Want::Both).collect()
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        fs::metadata(path)
            .map(|m| m.len())
            .map_err(io_error_with_help("stat file", path))
    }

    fn create_dirs(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(io_error_with_help("create directory", path))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read>> {
        let file = fs::File::open(path).map_err(io_error_with_help("open file", path))?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn replace_from_reader(&self, path: &Path, reader: &mut dyn Read, expected: Option<u64>) -> Result<u64> {
        atomic::replace_from_reader(path, reader, expected)
    }

    fn walk<'a>(&'a self, root: &Path, recurse: bool, want: Want) -> LocalWalk<'a> {
        let max_depth = if recurse { usize::MAX } else { 1 };
        let iter = WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |res| {
                let entry = match res {
                    Ok(entry) => entry,
                    Err(e) => {
                        let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                        return Some(Err(io_error_with_help("walk directory", &path)(io::Error::from(e))));
                    }
                };
                let ft = entry.file_type();
                if ft.is_dir() {
                    want.directories().then(|| {
                        Ok(LocalEntry {
                            path: entry.into_path(),
                            is_dir: true,
                            size: 0,
                        })
                    })
                } else if ft.is_file() {
                    if !want.files() {
                        return None;
                    }
                    Some(
                        entry
                            .metadata()
                            .map_err(|e| {
                                io_error_with_help("stat file", entry.path())(io::Error::from(e))
                            })
                            .map(|m| LocalEntry {
                                path: entry.path().to_path_buf(),
                                is_dir: false,
                                size: m.len(),
                            }),
                    )
                } else {
                    // symlinks and special files are not transferred
                    None
                }
            });
        Box::new(iter)
    }

    fn available_space(&self, path: &Path) -> io::Result<u64> {
        fs2::available_space(path)
    }
}
