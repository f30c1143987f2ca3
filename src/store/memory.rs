//! In-process `RemoteStore`.
//!
//! Behaves like the file-share service for everything the transfer layer
//! relies on: directories must be created one level at a time, files are
//! declared with a length before ranges are written, and a single range write
//! is capped (`MAX_RANGE_BYTES` unless overridden). It also records range
//! writes and directory creations so callers can inspect what happened.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, Cursor, Read};
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use super::{ChildEntry, MAX_RANGE_BYTES, Metadata, ObjectKind, RemoteStore};
use crate::errors::StoreError;
use crate::remote_path::RemotePath;

#[derive(Debug, Clone)]
enum NodeData {
    File(Vec<u8>),
    Directory,
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    metadata: Metadata,
}

/// A range write as observed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeWrite {
    pub path: RemotePath,
    pub offset: u64,
    pub len: u64,
}

#[derive(Debug, Default)]
struct State {
    share_exists: bool,
    nodes: BTreeMap<RemotePath, Node>,
    root_metadata: Metadata,
    range_writes: Vec<RangeWrite>,
    directory_creations: Vec<RemotePath>,
    failing_writes: HashSet<RemotePath>,
    truncated_reads: BTreeMap<RemotePath, usize>,
    failing_reads: HashSet<RemotePath>,
    failing_kind_probes: usize,
}

/// Thread-safe in-memory share.
#[derive(Debug)]
pub struct MemoryShare {
    name: String,
    max_write: u64,
    state: Mutex<State>,
}

impl MemoryShare {
    /// An existing, empty share.
    pub fn new(name: impl Into<String>) -> Self {
        let share = Self::missing(name);
        if let Ok(mut st) = share.state.lock() {
            st.share_exists = true;
        }
        share
    }

    /// A share that has not been created yet.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_write: MAX_RANGE_BYTES,
            state: Mutex::new(State::default()),
        }
    }

    /// Override the single-write cap.
    pub fn with_max_write(mut self, max_write: u64) -> Self {
        self.max_write = max_write;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Backend {
            message: "memory share state poisoned".into(),
        })
    }

    /// Full content of a file, if present.
    pub fn file_content(&self, path: &RemotePath) -> Option<Vec<u8>> {
        let st = self.state().ok()?;
        match st.nodes.get(path).map(|n| &n.data) {
            Some(NodeData::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Create a file with content, creating any missing parent directories.
    /// Intended for seeding fixtures; bypasses the write cap and the logs.
    pub fn seed_file(&self, path: &RemotePath, content: &[u8]) -> Result<(), StoreError> {
        let mut st = self.state()?;
        for anc in path.ancestors() {
            match st.nodes.get(&anc).map(|n| &n.data) {
                Some(NodeData::Directory) => {}
                Some(NodeData::File(_)) => {
                    return Err(StoreError::NotADirectory {
                        path: anc.to_string(),
                    });
                }
                None => {
                    st.nodes.insert(
                        anc.clone(),
                        Node {
                            data: NodeData::Directory,
                            metadata: Metadata::new(),
                        },
                    );
                }
            }
        }
        st.nodes.insert(
            path.clone(),
            Node {
                data: NodeData::File(content.to_vec()),
                metadata: Metadata::new(),
            },
        );
        Ok(())
    }

    /// Range writes in the order they were issued.
    pub fn range_writes(&self) -> Vec<RangeWrite> {
        self.state().map(|st| st.range_writes.clone()).unwrap_or_default()
    }

    /// Directories created through `create_directory`, in order.
    pub fn directory_creations(&self) -> Vec<RemotePath> {
        self.state()
            .map(|st| st.directory_creations.clone())
            .unwrap_or_default()
    }

    /// Make every range write to `path` fail with a backend error.
    pub fn fail_writes_to(&self, path: &RemotePath) {
        if let Ok(mut st) = self.state() {
            st.failing_writes.insert(path.clone());
        }
    }

    /// Make `read_all` of `path` stop after `keep` bytes while the declared
    /// length stays unchanged.
    pub fn truncate_reads_of(&self, path: &RemotePath, keep: usize) {
        if let Ok(mut st) = self.state() {
            st.truncated_reads.insert(path.clone(), keep);
        }
    }

    /// Make the stream returned by `read_all` of `path` fail on first read.
    pub fn fail_reads_of(&self, path: &RemotePath) {
        if let Ok(mut st) = self.state() {
            st.failing_reads.insert(path.clone());
        }
    }

    /// Make the next `count` calls to `kind` fail with a backend error.
    pub fn fail_next_kind_probes(&self, count: usize) {
        if let Ok(mut st) = self.state() {
            st.failing_kind_probes = count;
        }
    }

    fn require_share(&self, st: &State) -> Result<(), StoreError> {
        if st.share_exists {
            Ok(())
        } else {
            Err(StoreError::ShareNotFound {
                share: self.name.clone(),
            })
        }
    }
}

struct BrokenStream;

impl Read for BrokenStream {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "injected read failure"))
    }
}

fn not_found(path: &RemotePath) -> StoreError {
    StoreError::NotFound {
        path: path.to_string(),
    }
}

fn require_parent_dir(st: &State, path: &RemotePath) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Err(StoreError::AlreadyExists {
            path: path.to_string(),
        });
    };
    if parent.is_root() {
        return Ok(());
    }
    match st.nodes.get(&parent).map(|n| &n.data) {
        Some(NodeData::Directory) => Ok(()),
        Some(NodeData::File(_)) => Err(StoreError::NotADirectory {
            path: parent.to_string(),
        }),
        None => Err(not_found(&parent)),
    }
}

impl RemoteStore for MemoryShare {
    fn share_exists(&self) -> Result<bool, StoreError> {
        Ok(self.state()?.share_exists)
    }

    fn create_share(&self) -> Result<(), StoreError> {
        let mut st = self.state()?;
        if st.share_exists {
            return Err(StoreError::AlreadyExists {
                path: self.name.clone(),
            });
        }
        st.share_exists = true;
        Ok(())
    }

    fn kind(&self, path: &RemotePath) -> Result<Option<ObjectKind>, StoreError> {
        let mut st = self.state()?;
        self.require_share(&st)?;
        if st.failing_kind_probes > 0 {
            st.failing_kind_probes -= 1;
            return Err(StoreError::Backend {
                message: format!("injected probe failure for {path}"),
            });
        }
        if path.is_root() {
            return Ok(Some(ObjectKind::Directory));
        }
        Ok(st.nodes.get(path).map(|n| match n.data {
            NodeData::File(_) => ObjectKind::File,
            NodeData::Directory => ObjectKind::Directory,
        }))
    }

    fn create_directory(&self, path: &RemotePath) -> Result<(), StoreError> {
        let mut st = self.state()?;
        self.require_share(&st)?;
        if path.is_root() || st.nodes.contains_key(path) {
            return Err(StoreError::AlreadyExists {
                path: path.to_string(),
            });
        }
        require_parent_dir(&st, path)?;
        st.nodes.insert(
            path.clone(),
            Node {
                data: NodeData::Directory,
                metadata: Metadata::new(),
            },
        );
        st.directory_creations.push(path.clone());
        trace!(path = %path, "memory share: created directory");
        Ok(())
    }

    fn create_file(&self, path: &RemotePath, length: u64) -> Result<(), StoreError> {
        let mut st = self.state()?;
        self.require_share(&st)?;
        require_parent_dir(&st, path)?;
        let len = usize::try_from(length).map_err(|_| StoreError::Backend {
            message: format!("declared length {length} does not fit in memory"),
        })?;
        if matches!(st.nodes.get(path).map(|n| &n.data), Some(NodeData::Directory)) {
            return Err(StoreError::AlreadyExists {
                path: path.to_string(),
            });
        }
        // re-declaring a file resets content and metadata
        st.nodes.insert(
            path.clone(),
            Node {
                data: NodeData::File(vec![0; len]),
                metadata: Metadata::new(),
            },
        );
        Ok(())
    }

    fn write_range(&self, path: &RemotePath, offset: u64, data: &[u8]) -> Result<(), StoreError> {
        let len = data.len() as u64;
        if len > self.max_write {
            return Err(StoreError::WriteTooLarge {
                len,
                max: self.max_write,
            });
        }
        let mut st = self.state()?;
        self.require_share(&st)?;
        if st.failing_writes.contains(path) {
            return Err(StoreError::Backend {
                message: format!("injected write failure for {path}"),
            });
        }
        let content = match st.nodes.get_mut(path).map(|n| &mut n.data) {
            Some(NodeData::File(bytes)) => bytes,
            _ => return Err(not_found(path)),
        };
        let end = offset.saturating_add(len);
        if end > content.len() as u64 {
            return Err(StoreError::RangeOutOfBounds {
                path: path.to_string(),
                offset,
                end,
                length: content.len() as u64,
            });
        }
        // bounds checked above
        let start = offset as usize;
        content[start..start + data.len()].copy_from_slice(data);
        st.range_writes.push(RangeWrite {
            path: path.clone(),
            offset,
            len,
        });
        Ok(())
    }

    fn read_all(&self, path: &RemotePath) -> Result<Box<dyn Read + '_>, StoreError> {
        let st = self.state()?;
        self.require_share(&st)?;
        match st.nodes.get(path).map(|n| &n.data) {
            Some(NodeData::File(_)) if st.failing_reads.contains(path) => Ok(Box::new(BrokenStream)),
            Some(NodeData::File(bytes)) => {
                let keep = st.truncated_reads.get(path).copied().unwrap_or(bytes.len());
                Ok(Box::new(Cursor::new(bytes[..keep.min(bytes.len())].to_vec())))
            }
            _ => Err(not_found(path)),
        }
    }

    fn list_children(&self, path: &RemotePath) -> Result<Vec<ChildEntry>, StoreError> {
        let st = self.state()?;
        self.require_share(&st)?;
        if !path.is_root() {
            match st.nodes.get(path).map(|n| &n.data) {
                Some(NodeData::Directory) => {}
                Some(NodeData::File(_)) => {
                    return Err(StoreError::NotADirectory {
                        path: path.to_string(),
                    });
                }
                None => return Err(not_found(path)),
            }
        }
        let depth = path.depth() + 1;
        Ok(st
            .nodes
            .range(path.clone()..)
            .take_while(|(k, _)| k.starts_with(path))
            .filter(|(k, _)| k.depth() == depth)
            .filter_map(|(k, n)| {
                k.leaf().map(|name| ChildEntry {
                    name: name.to_string(),
                    is_directory: matches!(n.data, NodeData::Directory),
                })
            })
            .collect())
    }

    fn get_length(&self, path: &RemotePath) -> Result<u64, StoreError> {
        let st = self.state()?;
        self.require_share(&st)?;
        match st.nodes.get(path).map(|n| &n.data) {
            Some(NodeData::File(bytes)) => Ok(bytes.len() as u64),
            _ => Err(not_found(path)),
        }
    }

    fn get_metadata(&self, path: &RemotePath) -> Result<Metadata, StoreError> {
        let st = self.state()?;
        self.require_share(&st)?;
        if path.is_root() {
            return Ok(st.root_metadata.clone());
        }
        st.nodes
            .get(path)
            .map(|n| n.metadata.clone())
            .ok_or_else(|| not_found(path))
    }

    fn set_metadata(&self, path: &RemotePath, metadata: &Metadata) -> Result<(), StoreError> {
        let mut st = self.state()?;
        self.require_share(&st)?;
        if path.is_root() {
            st.root_metadata = metadata.clone();
            return Ok(());
        }
        let node = st.nodes.get_mut(path).ok_or_else(|| not_found(path))?;
        node.metadata = metadata.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_directory_requires_parent() {
        let share = MemoryShare::new("s");
        let err = share.create_directory(&RemotePath::parse("a/b")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        share.create_directory(&RemotePath::parse("a")).unwrap();
        share.create_directory(&RemotePath::parse("a/b")).unwrap();
        assert_eq!(share.kind(&RemotePath::parse("a/b")).unwrap(), Some(ObjectKind::Directory));
    }

    #[test]
    fn write_range_enforces_cap_and_bounds() {
        let share = MemoryShare::new("s").with_max_write(4);
        let p = RemotePath::parse("f.bin");
        share.create_file(&p, 6).unwrap();
        assert!(matches!(
            share.write_range(&p, 0, b"12345").unwrap_err(),
            StoreError::WriteTooLarge { .. }
        ));
        assert!(matches!(
            share.write_range(&p, 4, b"abc").unwrap_err(),
            StoreError::RangeOutOfBounds { .. }
        ));
        share.write_range(&p, 0, b"abcd").unwrap();
        share.write_range(&p, 4, b"ef").unwrap();
        assert_eq!(share.file_content(&p).unwrap(), b"abcdef");
    }

    #[test]
    fn list_children_is_one_level_and_sorted() {
        let share = MemoryShare::new("s");
        share.seed_file(&RemotePath::parse("d/b.txt"), b"b").unwrap();
        share.seed_file(&RemotePath::parse("d/a.txt"), b"a").unwrap();
        share.seed_file(&RemotePath::parse("d/sub/c.txt"), b"c").unwrap();
        share.seed_file(&RemotePath::parse("dd/x.txt"), b"x").unwrap();
        let names: Vec<_> = share
            .list_children(&RemotePath::parse("d"))
            .unwrap()
            .into_iter()
            .map(|c| (c.name, c.is_directory))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a.txt".to_string(), false),
                ("b.txt".to_string(), false),
                ("sub".to_string(), true)
            ]
        );
    }

    #[test]
    fn missing_share_rejects_operations() {
        let share = MemoryShare::missing("later");
        assert!(!share.share_exists().unwrap());
        assert!(matches!(
            share.kind(&RemotePath::root()).unwrap_err(),
            StoreError::ShareNotFound { .. }
        ));
        share.create_share().unwrap();
        assert!(share.exists(&RemotePath::root()).unwrap());
    }

    #[test]
    fn injected_faults_are_scoped() {
        let share = MemoryShare::new("s");
        let p = RemotePath::parse("f.txt");
        share.seed_file(&p, b"abcdef").unwrap();
        share.truncate_reads_of(&p, 2);
        let mut got = Vec::new();
        share.read_all(&p).unwrap().read_to_end(&mut got).unwrap();
        assert_eq!(got, b"ab");
        assert_eq!(share.get_length(&p).unwrap(), 6);

        share.fail_next_kind_probes(1);
        assert!(matches!(share.kind(&p).unwrap_err(), StoreError::Backend { .. }));
        assert_eq!(share.kind(&p).unwrap(), Some(ObjectKind::File));
    }
}
