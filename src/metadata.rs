//! Key/value metadata on remote files and directories.
//!
//! Every edit is a read-modify-write of the whole map. There is no
//! compare-and-swap, so two writers editing the same object can lose an
//! update; the last `set_metadata` wins.

use tracing::debug;

use crate::errors::{Result, ShareError};
use crate::handle::ObjectHandle;
use crate::store::{Metadata, RemoteStore};

pub struct MetadataEditor<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RemoteStore + ?Sized> MetadataEditor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The handle must point at an object of the kind it names.
    fn require(&self, target: &ObjectHandle) -> Result<()> {
        if self.store.kind(target.path())? == Some(target.expected_kind()) {
            Ok(())
        } else {
            Err(ShareError::ObjectNotFound(target.to_string()))
        }
    }

    pub fn get(&self, target: &ObjectHandle) -> Result<Metadata> {
        self.require(target)?;
        Ok(self.store.get_metadata(target.path())?)
    }

    /// Add `key`. When it is already present and `replace_if_exists` is
    /// false, fails with `DuplicateKey` and changes nothing.
    pub fn add(&self, target: &ObjectHandle, key: &str, value: &str, replace_if_exists: bool) -> Result<()> {
        let mut map = self.get(target)?;
        if !replace_if_exists && map.contains_key(key) {
            return Err(ShareError::DuplicateKey {
                key: key.to_string(),
                path: target.path().to_string(),
            });
        }
        map.insert(key.to_string(), value.to_string());
        self.store.set_metadata(target.path(), &map)?;
        debug!(target = %target, key, "metadata key added");
        Ok(())
    }

    /// Remove `key`. Returns whether it was present; absent keys cause no write.
    pub fn remove(&self, target: &ObjectHandle, key: &str) -> Result<bool> {
        let mut map = self.get(target)?;
        if map.remove(key).is_none() {
            return Ok(false);
        }
        self.store.set_metadata(target.path(), &map)?;
        debug!(target = %target, key, "metadata key removed");
        Ok(true)
    }

    pub fn clear(&self, target: &ObjectHandle) -> Result<()> {
        self.require(target)?;
        self.store.set_metadata(target.path(), &Metadata::new())?;
        debug!(target = %target, "metadata cleared");
        Ok(())
    }

    /// Replace the whole map.
    pub fn set(&self, target: &ObjectHandle, metadata: &Metadata) -> Result<()> {
        self.require(target)?;
        self.store.set_metadata(target.path(), metadata)?;
        debug!(target = %target, keys = metadata.len(), "metadata replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{DirectoryHandle, FileHandle};
    use crate::remote_path::RemotePath;
    use crate::store::MemoryShare;

    fn setup() -> (MemoryShare, ObjectHandle) {
        let share = MemoryShare::new("m");
        share.seed_file(&RemotePath::parse("docs/a.txt"), b"a").unwrap();
        let handle = FileHandle::new(RemotePath::parse("docs/a.txt")).into();
        (share, handle)
    }

    #[test]
    fn duplicate_key_keeps_original_value() {
        let (share, handle) = setup();
        let editor = MetadataEditor::new(&share);
        editor.add(&handle, "owner", "ops", false).unwrap();
        let err = editor.add(&handle, "owner", "dev", false).unwrap_err();
        assert!(matches!(err, ShareError::DuplicateKey { ref key, .. } if key == "owner"));
        assert_eq!(editor.get(&handle).unwrap().get("owner").map(String::as_str), Some("ops"));
    }

    #[test]
    fn remove_missing_key_is_a_no_op() {
        let (share, handle) = setup();
        let editor = MetadataEditor::new(&share);
        assert!(!editor.remove(&handle, "nothing").unwrap());
        editor.add(&handle, "k", "v", false).unwrap();
        assert!(editor.remove(&handle, "k").unwrap());
        assert!(editor.get(&handle).unwrap().is_empty());
    }

    #[test]
    fn kind_mismatch_is_object_not_found() {
        let (share, _) = setup();
        let editor = MetadataEditor::new(&share);
        let wrong: ObjectHandle = DirectoryHandle::new(RemotePath::parse("docs/a.txt")).into();
        assert!(matches!(editor.get(&wrong), Err(ShareError::ObjectNotFound(_))));
        let dir: ObjectHandle = DirectoryHandle::new(RemotePath::parse("docs")).into();
        let map = Metadata::from([("team".to_string(), "infra".to_string())]);
        editor.set(&dir, &map).unwrap();
        assert_eq!(editor.get(&dir).unwrap(), map);
        editor.clear(&dir).unwrap();
        assert!(editor.get(&dir).unwrap().is_empty());
    }
}
