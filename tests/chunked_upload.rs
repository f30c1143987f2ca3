//! Chunked uploads store exactly the same bytes as single-shot uploads.

use share_transfer::transfer::CHUNK_THRESHOLD;
use share_transfer::{FileHandle, MemoryShare, RemotePath, StdFs, TransferEngine, TransferOptions};

const T: u64 = 1024;

fn payload(len: u64) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

fn upload(share: &MemoryShare, name: &str, data: &[u8], chunk: u64) {
    let engine = TransferEngine::new(share, &StdFs).with_chunk_size(chunk);
    let file = FileHandle::new(RemotePath::parse(name));
    let written = engine
        .upload_bytes(&file, data, &TransferOptions::default())
        .expect("upload");
    assert_eq!(written, data.len() as u64);
}

#[test]
fn chunked_matches_single_around_threshold() {
    for (len, expected_writes) in [(T - 1, 1), (T, 1), (T + 1, 2), (3 * T, 3)] {
        let data = payload(len);

        // store caps single writes at T, so anything >= T must be chunked
        let chunked = MemoryShare::new("chunks").with_max_write(T);
        upload(&chunked, "f.bin", &data, T);

        let single = MemoryShare::new("single");
        upload(&single, "f.bin", &data, 4 * T);

        let path = RemotePath::parse("f.bin");
        assert_eq!(chunked.file_content(&path), single.file_content(&path), "len {len}");
        assert_eq!(chunked.file_content(&path).unwrap(), data);
        assert_eq!(chunked.range_writes().len(), expected_writes, "len {len}");
        assert_eq!(single.range_writes().len(), 1);
    }
}

#[test]
fn ranges_are_sequential_and_contiguous() {
    let share = MemoryShare::new("chunks").with_max_write(T);
    upload(&share, "big.bin", &payload(3 * T + 7), T);
    let writes = share.range_writes();
    let mut expected_offset = 0;
    for w in &writes {
        assert_eq!(w.offset, expected_offset);
        assert!(w.len <= T);
        expected_offset += w.len;
    }
    assert_eq!(expected_offset, 3 * T + 7);
}

#[test]
fn default_threshold_splits_just_over_four_megabytes() {
    let share = MemoryShare::new("default");
    let data = payload(CHUNK_THRESHOLD + 1);
    let engine = TransferEngine::new(&share, &StdFs);
    engine
        .upload_bytes(&FileHandle::new(RemotePath::parse("large.bin")), &data, &TransferOptions::default())
        .expect("upload");
    let writes = share.range_writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1].offset, CHUNK_THRESHOLD);
    assert_eq!(writes[1].len, 1);
    assert_eq!(share.file_content(&RemotePath::parse("large.bin")).unwrap(), data);
}

#[test]
fn streamed_local_file_upload() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("local.bin");
    let data = payload(2 * T + 5);
    std::fs::write(&src, &data).unwrap();

    let share = MemoryShare::new("stream").with_max_write(T);
    let engine = TransferEngine::new(&share, &StdFs).with_chunk_size(T);
    let file = FileHandle::parse("in/local.bin").unwrap();
    engine
        .upload_local_file(&src, &file, &TransferOptions::default())
        .expect("upload_local_file");
    assert_eq!(share.file_content(file.path()).unwrap(), data);
    assert_eq!(share.range_writes().len(), 3);
}
