//! Chunk planning for range-capped uploads.
//!
//! Pure logic, no I/O: turns a payload size into the sequence of contiguous,
//! non-overlapping ranges the upload loop writes.

/// One range write of a chunked upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    /// Zero-based chunk index.
    pub index: usize,
    /// Byte offset within the file.
    pub offset: u64,
    /// Length of this chunk in bytes.
    pub length: u64,
}

/// Whether a payload of `size` bytes must be split. Payloads below
/// `chunk_size` go in a single write; at or above it they are chunked.
pub fn needs_chunking(size: u64, chunk_size: u64) -> bool {
    chunk_size > 0 && size >= chunk_size
}

/// Split `size` bytes into ranges of `chunk_size`; the last may be shorter.
/// Empty payloads produce no chunks.
pub fn plan_chunks(size: u64, chunk_size: u64) -> Vec<ChunkInfo> {
    if size == 0 {
        return Vec::new();
    }
    if chunk_size == 0 {
        return vec![ChunkInfo {
            index: 0,
            offset: 0,
            length: size,
        }];
    }

    let mut chunks = Vec::with_capacity(size.div_ceil(chunk_size) as usize);
    let mut offset = 0u64;
    let mut index = 0usize;
    while offset < size {
        let length = chunk_size.min(size - offset);
        chunks.push(ChunkInfo { index, offset, length });
        offset += length;
        index += 1;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_boundaries() {
        assert!(!needs_chunking(99, 100));
        assert!(needs_chunking(100, 100));
        assert!(needs_chunking(101, 100));
        assert!(!needs_chunking(1_000_000, 0));
    }

    #[test]
    fn chunks_are_contiguous_and_cover_payload() {
        let chunks = plan_chunks(250, 100);
        assert_eq!(
            chunks,
            vec![
                ChunkInfo { index: 0, offset: 0, length: 100 },
                ChunkInfo { index: 1, offset: 100, length: 100 },
                ChunkInfo { index: 2, offset: 200, length: 50 },
            ]
        );
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let chunks = plan_chunks(300, 100);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.length == 100));
    }

    #[test]
    fn empty_payload_has_no_chunks() {
        assert!(plan_chunks(0, 100).is_empty());
    }
}
