//! Typed error definitions for share_transfer.
//! `StoreError` is what a `RemoteStore` backend reports; `ShareError` is what
//! the path/transfer layer returns to callers.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a `RemoteStore` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("remote object not found: {path}")]
    NotFound { path: String },

    #[error("remote object already exists: {path}")]
    AlreadyExists { path: String },

    #[error("remote parent is not a directory: {path}")]
    NotADirectory { path: String },

    #[error("range [{offset}, {end}) is outside declared length {length} of {path}")]
    RangeOutOfBounds {
        path: String,
        offset: u64,
        end: u64,
        length: u64,
    },

    #[error("single write of {len} bytes exceeds the store limit of {max} bytes")]
    WriteTooLarge { len: u64, max: u64 },

    #[error("share does not exist: {share}")]
    ShareNotFound { share: String },

    #[error("remote store error: {message}")]
    Backend { message: String },
}

/// Errors returned by path translation, directory materialization, walking,
/// transfers and metadata editing.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("path '{path}' is not below mapping anchor '{anchor}'")]
    PathOutsideMapping { path: String, anchor: String },

    #[error("local path not found: {0}")]
    LocalPathNotFound(PathBuf),

    #[error("remote path not found: {0}")]
    RemotePathNotFound(String),

    #[error("remote object not found: {0}")]
    ObjectNotFound(String),

    #[error("destination already exists and overwrite is not allowed: {0}")]
    OverwriteNotAllowed(String),

    #[error("metadata key '{key}' already exists on {path}")]
    DuplicateKey { key: String, path: String },

    #[error("failed to create remote directory {path}: {source}")]
    DirectoryCreate {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("transfer of {total} bytes exceeds the limit of {limit} bytes")]
    SizeLimitExceeded { total: u64, limit: u64 },

    #[error("insufficient disk space for destination {dest}: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        required: u64,
        available: u64,
        dest: PathBuf,
    },

    #[error("share not found and creation is disabled: {0}")]
    ShareNotFound(String),

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("remote path {path} is not a {expected}")]
    WrongObjectKind { path: String, expected: &'static str },

    #[error("length mismatch for {path}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("read remote stream for {path}: {source}")]
    RemoteRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{message}")]
    LocalIo {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl ShareError {
    /// Build an `InvalidPath` error.
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ShareError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = ShareError> = std::result::Result<T, E>;
