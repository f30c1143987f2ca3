//! Remote path model.
//!
//! A `RemotePath` is an ordered list of segment names relative to the share
//! root. Parsing accepts either separator style and normalizes lexically, so
//! `"/a//b\\c/"` and `"a/b/c"` are the same path. Equality, hashing and prefix
//! tests compare segments, never the rendered string.

use std::fmt;

use crate::errors::{Result, ShareError};

/// Separator used when rendering a remote path.
pub const REMOTE_SEPARATOR: char = '/';

#[inline]
fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// A location in the remote share, relative to its root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath {
    segments: Vec<String>,
}

impl RemotePath {
    /// The share root (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a flat path string.
    ///
    /// Empty segments and `.` are dropped; `..` removes the previous segment
    /// and is ignored at the root, so a parsed path never escapes the share.
    pub fn parse(raw: &str) -> Self {
        let mut segments: Vec<String> = Vec::new();
        for seg in raw.split(is_separator) {
            match seg {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s.to_string()),
            }
        }
        Self { segments }
    }

    /// Build from already-split segment names. Each name must be a plain
    /// segment (non-empty, no separators, not `.`/`..`).
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::root();
        for seg in segments {
            out.push(seg)?;
        }
        Ok(out)
    }

    /// Append one segment.
    pub fn push(&mut self, segment: impl Into<String>) -> Result<()> {
        let segment = segment.into();
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains(is_separator) {
            return Err(ShareError::invalid_path(
                segment,
                "not a plain path segment",
            ));
        }
        self.segments.push(segment);
        Ok(())
    }

    /// Return a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self> {
        let mut out = self.clone();
        out.push(segment)?;
        Ok(out)
    }

    /// Join a relative path string (either separator style) onto this one.
    pub fn join(&self, relative: &str) -> Self {
        let mut out = self.clone();
        out.segments.extend(Self::parse(relative).segments);
        out
    }

    /// Append all segments of `suffix`.
    pub fn join_path(&self, suffix: &RemotePath) -> Self {
        let mut out = self.clone();
        out.segments.extend(suffix.segments.iter().cloned());
        out
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last segment, `None` for the root.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent directory, `None` for the root.
    pub fn parent(&self) -> Option<RemotePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Split into (parent directory, leaf). `None` for the root.
    pub fn split_leaf(&self) -> Option<(RemotePath, String)> {
        let (leaf, dir) = self.segments.split_last()?;
        Some((
            Self {
                segments: dir.to_vec(),
            },
            leaf.clone(),
        ))
    }

    /// Segment-wise prefix test; a path starts with itself and with the root.
    pub fn starts_with(&self, prefix: &RemotePath) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Remove `prefix`, returning the relative remainder.
    pub fn strip_prefix(&self, prefix: &RemotePath) -> Option<RemotePath> {
        if !self.starts_with(prefix) {
            return None;
        }
        Some(Self {
            segments: self.segments[prefix.segments.len()..].to_vec(),
        })
    }

    /// Every proper ancestor from the root's first child down to the parent.
    pub fn ancestors(&self) -> impl Iterator<Item = RemotePath> + '_ {
        (1..self.segments.len()).map(move |n| Self {
            segments: self.segments[..n].to_vec(),
        })
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{REMOTE_SEPARATOR}")?;
            }
            f.write_str(seg)?;
        }
        Ok(())
    }
}

impl From<&str> for RemotePath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Split a flat remote path on its last separator into (directory, leaf).
///
/// With no separator the directory is the root and the leaf is the whole
/// string. Paths that name nothing (`""`, `"/"`) are rejected.
pub fn split_remote_path(raw: &str) -> Result<(RemotePath, String)> {
    RemotePath::parse(raw)
        .split_leaf()
        .ok_or_else(|| ShareError::invalid_path(raw, "path does not name a file or directory"))
}
