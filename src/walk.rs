//! Remote tree enumeration.
//!
//! `list_entries` returns a lazy pre-order iterator: a directory's own entry
//! comes first, then its contents, then its next sibling. Children of a
//! directory are listed only when the iterator reaches it. Traversal uses an
//! explicit stack, so tree depth does not grow the call stack.

use std::vec;

use tracing::trace;

use crate::errors::{Result, ShareError};
use crate::handle::{DirectoryHandle, FileHandle};
use crate::remote_path::RemotePath;
use crate::store::{ChildEntry, ObjectKind, RemoteStore};

/// Which entry kinds a listing should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Want {
    Files,
    Directories,
    #[default]
    Both,
}

impl Want {
    pub fn files(self) -> bool {
        matches!(self, Want::Files | Want::Both)
    }

    pub fn directories(self) -> bool {
        matches!(self, Want::Directories | Want::Both)
    }
}

/// One item produced by a remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEntry {
    File(FileHandle),
    Directory(DirectoryHandle),
}

impl RemoteEntry {
    pub fn path(&self) -> &RemotePath {
        match self {
            RemoteEntry::File(f) => f.path(),
            RemoteEntry::Directory(d) => d.path(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, RemoteEntry::Directory(_))
    }
}

struct Frame {
    dir: RemotePath,
    /// `None` until the directory has been listed.
    children: Option<vec::IntoIter<ChildEntry>>,
}

/// Lazy pre-order walk over a remote directory.
pub struct RemoteWalk<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    stack: Vec<Frame>,
    recurse: bool,
    want: Want,
    root_checked: bool,
}

impl<'a, S: RemoteStore + ?Sized> RemoteWalk<'a, S> {
    fn new(store: &'a S, dir: RemotePath, recurse: bool, want: Want) -> Self {
        Self {
            store,
            stack: vec![Frame {
                dir,
                children: None,
            }],
            recurse,
            want,
            root_checked: false,
        }
    }

    fn check_root(&mut self) -> Result<()> {
        self.root_checked = true;
        let Some(frame) = self.stack.first() else {
            return Ok(());
        };
        let err = match self.store.kind(&frame.dir) {
            Ok(Some(ObjectKind::Directory)) => return Ok(()),
            Ok(_) => ShareError::RemotePathNotFound(frame.dir.to_string()),
            Err(e) => e.into(),
        };
        // nothing below an unverified root is listed
        self.stack.clear();
        Err(err)
    }
}

impl<S: RemoteStore + ?Sized> Iterator for RemoteWalk<'_, S> {
    type Item = Result<RemoteEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.root_checked {
            if let Err(e) = self.check_root() {
                return Some(Err(e));
            }
        }

        loop {
            let frame = self.stack.last_mut()?;
            if frame.children.is_none() {
                match self.store.list_children(&frame.dir) {
                    Ok(children) => {
                        trace!(dir = %frame.dir, count = children.len(), "listed remote directory");
                        frame.children = Some(children.into_iter());
                    }
                    Err(e) => {
                        // an unreadable subtree is reported once and skipped
                        self.stack.pop();
                        return Some(Err(e.into()));
                    }
                }
            }

            let next_child = frame.children.as_mut().and_then(Iterator::next);
            let Some(child) = next_child else {
                self.stack.pop();
                continue;
            };

            let path = match frame.dir.child(child.name) {
                Ok(p) => p,
                Err(e) => return Some(Err(e)),
            };

            if child.is_directory {
                if self.recurse {
                    self.stack.push(Frame {
                        dir: path.clone(),
                        children: None,
                    });
                }
                if self.want.directories() {
                    return Some(Ok(RemoteEntry::Directory(DirectoryHandle::new(path))));
                }
            } else if self.want.files() {
                return Some(Ok(RemoteEntry::File(FileHandle::new(path))));
            }
        }
    }
}

/// Enumerate entries below `dir`. Each call starts a fresh enumeration.
/// A missing `dir` yields a single `RemotePathNotFound`.
pub fn list_entries<'a, S: RemoteStore + ?Sized>(
    store: &'a S,
    dir: &DirectoryHandle,
    recurse: bool,
    want: Want,
) -> RemoteWalk<'a, S> {
    RemoteWalk::new(store, dir.path().clone(), recurse, want)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryShare;

    fn fixture() -> MemoryShare {
        let share = MemoryShare::new("walk");
        share.seed_file(&RemotePath::parse("top/a.txt"), b"a").unwrap();
        share.seed_file(&RemotePath::parse("top/m/deep/x.txt"), b"x").unwrap();
        share.seed_file(&RemotePath::parse("top/z.txt"), b"z").unwrap();
        share
    }

    fn paths<S: RemoteStore>(walk: RemoteWalk<'_, S>) -> Vec<String> {
        walk.map(|e| e.unwrap().path().to_string()).collect()
    }

    #[test]
    fn recursive_walk_is_pre_order() {
        let share = fixture();
        let dir = DirectoryHandle::new(RemotePath::parse("top"));
        assert_eq!(
            paths(list_entries(&share, &dir, true, Want::Both)),
            vec!["top/a.txt", "top/m", "top/m/deep", "top/m/deep/x.txt", "top/z.txt"]
        );
    }

    #[test]
    fn directories_only() {
        let share = fixture();
        let dir = DirectoryHandle::new(RemotePath::parse("top"));
        assert_eq!(
            paths(list_entries(&share, &dir, true, Want::Directories)),
            vec!["top/m", "top/m/deep"]
        );
    }

    #[test]
    fn missing_dir_reports_not_found_once() {
        let share = fixture();
        let dir = DirectoryHandle::new(RemotePath::parse("nope"));
        let items: Vec<_> = list_entries(&share, &dir, true, Want::Both).collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ShareError::RemotePathNotFound(_))));
    }

    #[test]
    fn walk_is_restartable() {
        let share = fixture();
        let dir = DirectoryHandle::new(RemotePath::parse("top"));
        let first = paths(list_entries(&share, &dir, true, Want::Files));
        share.seed_file(&RemotePath::parse("top/b.txt"), b"b").unwrap();
        let second = paths(list_entries(&share, &dir, true, Want::Files));
        assert_eq!(first.len() + 1, second.len());
    }

    #[test]
    fn failed_root_lookup_ends_the_walk() {
        let share = fixture();
        share.fail_next_kind_probes(1);
        let dir = DirectoryHandle::new(RemotePath::parse("top"));
        let items: Vec<_> = list_entries(&share, &dir, true, Want::Both).collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ShareError::Store(_))));
    }
}
