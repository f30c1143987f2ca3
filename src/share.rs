//! `Share`: a connected share plus the configured transfer options.
//! Entry point that hands out handles, engines and metadata editors.

use tracing::info;

use crate::config::Config;
use crate::ensure::ensure_directory_chain;
use crate::errors::{Result, ShareError, StoreError};
use crate::handle::{DirectoryHandle, FileHandle, ObjectHandle};
use crate::local::StdFs;
use crate::metadata::MetadataEditor;
use crate::remote_path::RemotePath;
use crate::store::RemoteStore;
use crate::transfer::{TransferEngine, TransferOptions};
use crate::walk::{RemoteWalk, Want, list_entries};

pub struct Share<S: RemoteStore> {
    store: S,
    name: String,
    options: TransferOptions,
    chunk_size: u64,
    local: StdFs,
}

impl<S: RemoteStore> Share<S> {
    /// Bind `store` to the share named in `config`, creating it on first use
    /// when `create_share` is set.
    pub fn open(store: S, config: &Config) -> Result<Self> {
        if !store.share_exists()? {
            if !config.create_share {
                return Err(ShareError::ShareNotFound(config.share.clone()));
            }
            match store.create_share() {
                Ok(()) => info!(share = %config.share, "created share"),
                // created by someone else in the meantime
                Err(StoreError::AlreadyExists { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!(connection = %config.connection, share = %config.share, "share opened");
        Ok(Self {
            store,
            name: config.share.clone(),
            options: config.options,
            chunk_size: config.chunk_size,
            local: StdFs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Options from the configuration; pass a modified copy per call to deviate.
    pub fn options(&self) -> TransferOptions {
        self.options
    }

    pub fn root(&self) -> DirectoryHandle {
        DirectoryHandle::root()
    }

    pub fn directory(&self, path: &str) -> DirectoryHandle {
        DirectoryHandle::new(RemotePath::parse(path))
    }

    pub fn file(&self, path: &str) -> Result<FileHandle> {
        FileHandle::parse(path)
    }

    /// Whether an object of the handle's kind exists at its path.
    pub fn exists(&self, handle: &ObjectHandle) -> Result<bool> {
        Ok(self.store.kind(handle.path())? == Some(handle.expected_kind()))
    }

    pub fn ensure_directory(&self, dir: &DirectoryHandle) -> Result<usize> {
        ensure_directory_chain(&self.store, dir)
    }

    pub fn list_entries(&self, dir: &DirectoryHandle, recurse: bool, want: Want) -> RemoteWalk<'_, S> {
        list_entries(&self.store, dir, recurse, want)
    }

    pub fn engine(&self) -> TransferEngine<'_, S, StdFs> {
        TransferEngine::new(&self.store, &self.local).with_chunk_size(self.chunk_size)
    }

    pub fn metadata(&self) -> MetadataEditor<'_, S> {
        MetadataEditor::new(&self.store)
    }
}
