//! Remote store capability.
//!
//! `RemoteStore` is the seam between the transfer layer and whatever talks to
//! the file-share service. Implementations are thin: they perform one remote
//! call per method and report failures as `StoreError`. Retry policy, if any,
//! lives inside the implementation.

use std::collections::HashMap;
use std::io::Read;

use crate::errors::StoreError;
use crate::remote_path::RemotePath;

pub mod memory;

pub use memory::MemoryShare;

/// Largest payload the service accepts in a single range write (4 MiB).
pub const MAX_RANGE_BYTES: u64 = 4 * 1024 * 1024;

/// What a remote path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    File,
    Directory,
}

/// One entry returned by `RemoteStore::list_children`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    /// Segment name (no separators).
    pub name: String,
    pub is_directory: bool,
}

/// Key-value metadata attached to a remote file or directory.
pub type Metadata = HashMap<String, String>;

/// Low-level share operations - implemented by each backend.
pub trait RemoteStore {
    /// Whether the share itself exists.
    fn share_exists(&self) -> Result<bool, StoreError>;

    /// Create the share. Fails with `AlreadyExists` if it is already there.
    fn create_share(&self) -> Result<(), StoreError>;

    /// Kind of object at `path`, `None` if nothing is there.
    /// The root always reports `Directory`.
    fn kind(&self, path: &RemotePath) -> Result<Option<ObjectKind>, StoreError>;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &RemotePath) -> Result<bool, StoreError> {
        Ok(self.kind(path)?.is_some())
    }

    /// Create a single directory. The parent must exist.
    /// Fails with `AlreadyExists` if something is already at `path`.
    fn create_directory(&self, path: &RemotePath) -> Result<(), StoreError>;

    /// Declare (or re-declare, truncating) a file with its final length.
    /// Content is zero-filled until written.
    fn create_file(&self, path: &RemotePath, length: u64) -> Result<(), StoreError>;

    /// Write `data` at `[offset, offset + data.len())` inside the declared length.
    fn write_range(&self, path: &RemotePath, offset: u64, data: &[u8]) -> Result<(), StoreError>;

    /// Stream the full content of a file.
    fn read_all(&self, path: &RemotePath) -> Result<Box<dyn Read + '_>, StoreError>;

    /// Immediate children of a directory.
    fn list_children(&self, path: &RemotePath) -> Result<Vec<ChildEntry>, StoreError>;

    /// Declared length of a file.
    fn get_length(&self, path: &RemotePath) -> Result<u64, StoreError>;

    fn get_metadata(&self, path: &RemotePath) -> Result<Metadata, StoreError>;

    /// Replace the whole metadata map.
    fn set_metadata(&self, path: &RemotePath, metadata: &Metadata) -> Result<(), StoreError>;
}

impl<S: RemoteStore + ?Sized> RemoteStore for &S {
    fn share_exists(&self) -> Result<bool, StoreError> {
        (**self).share_exists()
    }
    fn create_share(&self) -> Result<(), StoreError> {
        (**self).create_share()
    }
    fn kind(&self, path: &RemotePath) -> Result<Option<ObjectKind>, StoreError> {
        (**self).kind(path)
    }
    fn create_directory(&self, path: &RemotePath) -> Result<(), StoreError> {
        (**self).create_directory(path)
    }
    fn create_file(&self, path: &RemotePath, length: u64) -> Result<(), StoreError> {
        (**self).create_file(path, length)
    }
    fn write_range(&self, path: &RemotePath, offset: u64, data: &[u8]) -> Result<(), StoreError> {
        (**self).write_range(path, offset, data)
    }
    fn read_all(&self, path: &RemotePath) -> Result<Box<dyn Read + '_>, StoreError> {
        (**self).read_all(path)
    }
    fn list_children(&self, path: &RemotePath) -> Result<Vec<ChildEntry>, StoreError> {
        (**self).list_children(path)
    }
    fn get_length(&self, path: &RemotePath) -> Result<u64, StoreError> {
        (**self).get_length(path)
    }
    fn get_metadata(&self, path: &RemotePath) -> Result<Metadata, StoreError> {
        (**self).get_metadata(path)
    }
    fn set_metadata(&self, path: &RemotePath, metadata: &Metadata) -> Result<(), StoreError> {
        (**self).set_metadata(path, metadata)
    }
}
