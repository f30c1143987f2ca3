//! Local <-> remote path translation.
//!
//! A `PathMapping` pairs a remote anchor directory with a local anchor
//! directory. Everything below one anchor corresponds 1:1 to the same relative
//! suffix below the other; only separator style differs. Paths that are not
//! below the respective anchor are rejected, never truncated.

use std::path::{Component, Path, PathBuf};

use crate::errors::{Result, ShareError};
use crate::remote_path::RemotePath;

/// Lexical path normalization without filesystem access.
///
/// Removes `.` components and resolves `..` lexically. Verbatim Windows
/// prefixes (`\\?\C:\`) are simplified first so they compare equal to the
/// plain form.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in dunce::simplified(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !components.is_empty()
                    && !matches!(
                        components.last(),
                        Some(Component::ParentDir) | Some(Component::RootDir) | Some(Component::Prefix(_))
                    )
                {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Paired anchors establishing a correspondence between a remote subtree and
/// a local subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    remote_anchor: RemotePath,
    local_anchor: PathBuf,
}

impl PathMapping {
    pub fn new(remote_anchor: RemotePath, local_anchor: impl Into<PathBuf>) -> Self {
        Self {
            remote_anchor,
            local_anchor: local_anchor.into(),
        }
    }

    pub fn remote_anchor(&self) -> &RemotePath {
        &self.remote_anchor
    }

    pub fn local_anchor(&self) -> &Path {
        &self.local_anchor
    }

    /// Translate a remote path below the remote anchor to its local twin.
    pub fn to_local(&self, remote: &RemotePath) -> Result<PathBuf> {
        let rel = remote
            .strip_prefix(&self.remote_anchor)
            .ok_or_else(|| ShareError::PathOutsideMapping {
                path: remote.to_string(),
                anchor: self.remote_anchor.to_string(),
            })?;

        let mut out = self.local_anchor.clone();
        for seg in rel.segments() {
            out.push(seg);
        }
        Ok(out)
    }

    /// Translate a local path below the local anchor to its remote twin.
    pub fn to_remote(&self, local: &Path) -> Result<RemotePath> {
        let local_norm = lexical_normalize(local);
        let anchor_norm = lexical_normalize(&self.local_anchor);

        let rel = local_norm
            .strip_prefix(&anchor_norm)
            .map_err(|_| ShareError::PathOutsideMapping {
                path: local.display().to_string(),
                anchor: self.local_anchor.display().to_string(),
            })?;

        let mut out = self.remote_anchor.clone();
        for comp in rel.components() {
            match comp {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        ShareError::invalid_path(local.display().to_string(), "segment is not valid UTF-8")
                    })?;
                    out.push(name)?;
                }
                Component::CurDir => {}
                _ => {
                    return Err(ShareError::invalid_path(
                        local.display().to_string(),
                        "unexpected component below the local anchor",
                    ));
                }
            }
        }
        Ok(out)
    }
}
