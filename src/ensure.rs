//! Remote directory materialization.
//!
//! `DirectoryEnsurer` makes sure a remote directory and all its ancestors
//! exist. It probes bottom-up until it finds an existing ancestor, then creates
//! the missing levels top-down. Directories it has seen (existing or created)
//! are remembered, so a transfer job probes each parent at most once.
//!
//! Another writer may create the same directory between our probe and our
//! create; the store's `AlreadyExists` is accepted as success in that case.

use std::collections::HashSet;

use tracing::debug;

use crate::errors::{Result, ShareError, StoreError};
use crate::handle::DirectoryHandle;
use crate::remote_path::RemotePath;
use crate::store::{ObjectKind, RemoteStore};

fn create_error(path: &RemotePath, source: StoreError) -> ShareError {
    ShareError::DirectoryCreate {
        path: path.to_string(),
        source,
    }
}

/// Memoizing ensure-exists helper bound to one store.
pub struct DirectoryEnsurer<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    known: HashSet<RemotePath>,
    created: usize,
}

impl<'a, S: RemoteStore + ?Sized> DirectoryEnsurer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            known: HashSet::new(),
            created: 0,
        }
    }

    /// Total directories created by this instance.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Ensure `target` and its ancestors exist. Returns how many were created.
    pub fn ensure(&mut self, target: &RemotePath) -> Result<usize> {
        // bottom-up probe
        let mut missing: Vec<RemotePath> = Vec::new();
        let mut cursor = Some(target.clone());
        loop {
            let Some(dir) = cursor.take() else { break };
            if dir.is_root() || self.known.contains(&dir) {
                break;
            }
            match self.store.kind(&dir)? {
                Some(ObjectKind::Directory) => {
                    self.known.insert(dir);
                    break;
                }
                Some(ObjectKind::File) => {
                    return Err(create_error(
                        &dir,
                        StoreError::NotADirectory {
                            path: dir.to_string(),
                        },
                    ));
                }
                None => {
                    cursor = dir.parent();
                    missing.push(dir);
                }
            }
        }

        // top-down create
        let mut created = 0;
        for dir in missing.into_iter().rev() {
            match self.store.create_directory(&dir) {
                Ok(()) => {
                    created += 1;
                    debug!(path = %dir, "created remote directory");
                }
                Err(StoreError::AlreadyExists { .. }) => {
                    if self.store.kind(&dir)? != Some(ObjectKind::Directory) {
                        return Err(create_error(
                            &dir,
                            StoreError::NotADirectory {
                                path: dir.to_string(),
                            },
                        ));
                    }
                    debug!(path = %dir, "remote directory appeared concurrently");
                }
                Err(e) => return Err(create_error(&dir, e)),
            }
            self.known.insert(dir);
        }
        self.created += created;
        Ok(created)
    }
}

/// One-shot form of `DirectoryEnsurer::ensure`.
pub fn ensure_directory_chain<S: RemoteStore + ?Sized>(store: &S, target: &DirectoryHandle) -> Result<usize> {
    DirectoryEnsurer::new(store).ensure(target.path())
}
