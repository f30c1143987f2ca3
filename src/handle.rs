//! Handles: lightweight references to remote locations.
//! Building a handle never touches the store; existence is a separate query.

use std::fmt;

use crate::errors::Result;
use crate::remote_path::{RemotePath, split_remote_path};
use crate::store::ObjectKind;

/// Reference to a remote directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryHandle {
    path: RemotePath,
}

impl DirectoryHandle {
    pub fn new(path: RemotePath) -> Self {
        Self { path }
    }

    pub fn root() -> Self {
        Self::new(RemotePath::root())
    }

    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    pub fn subdirectory(&self, name: impl Into<String>) -> Result<DirectoryHandle> {
        Ok(DirectoryHandle::new(self.path.child(name)?))
    }

    pub fn file(&self, name: impl Into<String>) -> Result<FileHandle> {
        Ok(FileHandle::new(self.path.child(name)?))
    }

    pub fn parent(&self) -> Option<DirectoryHandle> {
        self.path.parent().map(DirectoryHandle::new)
    }
}

/// Reference to a remote file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle {
    path: RemotePath,
}

impl FileHandle {
    pub fn new(path: RemotePath) -> Self {
        Self { path }
    }

    /// Build from a combined "dir/sub/name" string.
    pub fn parse(raw: &str) -> Result<Self> {
        let (dir, name) = split_remote_path(raw)?;
        Ok(Self::new(dir.child(name)?))
    }

    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    /// Directory holding this file (the root for top-level files).
    pub fn directory(&self) -> DirectoryHandle {
        DirectoryHandle::new(self.path.parent().unwrap_or_default())
    }

    pub fn name(&self) -> &str {
        self.path.leaf().unwrap_or_default()
    }
}

/// Either kind of handle, for operations valid on both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectHandle {
    File(FileHandle),
    Directory(DirectoryHandle),
}

impl ObjectHandle {
    pub fn path(&self) -> &RemotePath {
        match self {
            ObjectHandle::File(f) => f.path(),
            ObjectHandle::Directory(d) => d.path(),
        }
    }

    /// The object kind this handle expects to find in the store.
    pub fn expected_kind(&self) -> ObjectKind {
        match self {
            ObjectHandle::File(_) => ObjectKind::File,
            ObjectHandle::Directory(_) => ObjectKind::Directory,
        }
    }
}

impl From<FileHandle> for ObjectHandle {
    fn from(h: FileHandle) -> Self {
        ObjectHandle::File(h)
    }
}

impl From<DirectoryHandle> for ObjectHandle {
    fn from(h: DirectoryHandle) -> Self {
        ObjectHandle::Directory(h)
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectHandle::File(h) => write!(f, "file {}", h.path()),
            ObjectHandle::Directory(h) => write!(f, "directory {}", h.path()),
        }
    }
}
