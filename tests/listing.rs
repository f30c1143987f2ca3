//! Remote listings: recursion and kind filters.

use share_transfer::{DirectoryHandle, MemoryShare, RemoteEntry, RemotePath, Want, list_entries};

/// root/{one.txt, two.txt, nested/three.txt}
fn share() -> MemoryShare {
    let share = MemoryShare::new("list");
    share.seed_file(&RemotePath::parse("root/one.txt"), b"1").unwrap();
    share.seed_file(&RemotePath::parse("root/two.txt"), b"2").unwrap();
    share.seed_file(&RemotePath::parse("root/nested/three.txt"), b"3").unwrap();
    share
}

fn collect(share: &MemoryShare, recurse: bool, want: Want) -> Vec<RemoteEntry> {
    let root = DirectoryHandle::new(RemotePath::parse("root"));
    list_entries(share, &root, recurse, want)
        .collect::<Result<Vec<_>, _>>()
        .expect("listing")
}

#[test]
fn non_recursive_sees_immediate_children_only() {
    let share = share();
    let entries = collect(&share, false, Want::Both);
    let files = entries.iter().filter(|e| !e.is_dir()).count();
    let dirs = entries.iter().filter(|e| e.is_dir()).count();
    assert_eq!((files, dirs), (2, 1));
}

#[test]
fn recursive_files_only() {
    let share = share();
    let mut names: Vec<String> = collect(&share, true, Want::Files)
        .iter()
        .map(|e| e.path().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["root/nested/three.txt", "root/one.txt", "root/two.txt"]);
}

#[test]
fn directory_filter_skips_files() {
    let share = share();
    share.seed_file(&RemotePath::parse("empty/.keep"), b"").unwrap();
    let dir = DirectoryHandle::new(RemotePath::parse("empty"));
    assert_eq!(list_entries(&share, &dir, true, Want::Directories).count(), 0);
}
