//! Transfer engine.
//!
//! Single-file upload/download plus whole-directory copies in either
//! direction. Everything runs sequentially on the calling thread.
//!
//! # Size ceiling
//!
//! Directory jobs sum the sizes of every file they would move and refuse the
//! whole job with `SizeLimitExceeded` before touching anything when the total
//! is above `max_total_bytes`. Once a job starts, a failure part-way leaves
//! already transferred files in place.
//!
//! # Chunking
//!
//! The share caps a single range write (`MAX_RANGE_BYTES`). Payloads of at
//! least `chunk_size` bytes are written as sequential ranges through one
//! chunk-sized buffer owned by the call.

use tracing::debug;

use crate::errors::{Result, ShareError};
use crate::local::LocalFs;
use crate::store::{MAX_RANGE_BYTES, RemoteStore};

pub mod chunk;
mod download;
mod upload;

pub use chunk::{ChunkInfo, needs_chunking, plan_chunks};

/// Default chunk threshold: a round number just under the 4 MiB range cap.
pub const CHUNK_THRESHOLD: u64 = 4_000_000;

/// Default directory transfer ceiling (10 MiB).
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 10 * 1024 * 1024;

/// Per-call options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Replace an existing destination file.
    pub allow_overwrite: bool,
    /// Create missing parent directories on the destination side.
    pub create_parent_dirs: bool,
    /// Descend into subdirectories for directory jobs.
    pub recurse: bool,
    /// Ceiling on the summed size of a directory job.
    pub max_total_bytes: u64,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            allow_overwrite: true,
            create_parent_dirs: true,
            recurse: true,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
        }
    }
}

impl TransferOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    pub fn with_create_parent_dirs(mut self, create: bool) -> Self {
        self.create_parent_dirs = create;
        self
    }

    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    pub fn with_max_total_bytes(mut self, max: u64) -> Self {
        self.max_total_bytes = max;
        self
    }

    /// Options applied to each file inside a directory job.
    fn for_tree_member(&self) -> Self {
        Self {
            allow_overwrite: true,
            create_parent_dirs: true,
            ..*self
        }
    }
}

/// Counters for one transfer job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub files: u64,
    pub bytes: u64,
    pub directories_created: usize,
}

fn check_size_limit(total: u64, limit: u64) -> Result<()> {
    if total > limit {
        return Err(ShareError::SizeLimitExceeded { total, limit });
    }
    debug!(total, limit, "size precheck passed");
    Ok(())
}

/// Moves bytes between a `RemoteStore` and a `LocalFs`.
pub struct TransferEngine<'a, S: RemoteStore + ?Sized, L: LocalFs + ?Sized> {
    store: &'a S,
    local: &'a L,
    chunk_size: u64,
}

impl<'a, S: RemoteStore + ?Sized, L: LocalFs + ?Sized> TransferEngine<'a, S, L> {
    pub fn new(store: &'a S, local: &'a L) -> Self {
        Self {
            store,
            local,
            chunk_size: CHUNK_THRESHOLD,
        }
    }

    /// Override the chunk size, clamped to `1..=MAX_RANGE_BYTES`.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_RANGE_BYTES);
        self
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::StdFs;
    use crate::store::MemoryShare;

    #[test]
    fn chunk_size_is_clamped_to_range_cap() {
        let share = MemoryShare::new("t");
        let engine = TransferEngine::new(&share, &StdFs).with_chunk_size(u64::MAX);
        assert_eq!(engine.chunk_size(), MAX_RANGE_BYTES);
        let engine = TransferEngine::new(&share, &StdFs).with_chunk_size(0);
        assert_eq!(engine.chunk_size(), 1);
    }

    #[test]
    fn limit_is_inclusive() {
        assert!(check_size_limit(10, 10).is_ok());
        assert!(matches!(
            check_size_limit(11, 10),
            Err(ShareError::SizeLimitExceeded { total: 11, limit: 10 })
        ));
    }

    #[test]
    fn tree_members_always_overwrite() {
        let opts = TransferOptions::new()
            .with_allow_overwrite(false)
            .with_create_parent_dirs(false)
            .with_max_total_bytes(5);
        let member = opts.for_tree_member();
        assert!(member.allow_overwrite);
        assert!(member.create_parent_dirs);
        assert_eq!(member.max_total_bytes, 5);
    }
}
