//! I/O error enrichment.
//!
//! Wraps a raw `io::Error` into `ShareError::LocalIo` with the operation, the
//! path and, when the OS code is recognized, an actionable hint.
//!
//! Usage:
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create directory", dir))?;

use std::io;
use std::path::Path;

use crate::errors::ShareError;

#[cfg(unix)]
fn hint_for_os_code(code: i32) -> Option<&'static str> {
    match code {
        libc::EACCES | libc::EPERM => Some("permission denied; check ownership and write permissions"),
        libc::EXDEV => Some("cross-filesystem; atomic rename not possible"),
        libc::EBUSY => Some("resource busy; ensure no other process is writing"),
        libc::ENOENT => Some("path not found; verify it exists"),
        libc::EEXIST => Some("already exists; pick a unique name or remove the target"),
        libc::ENOSPC => Some("insufficient space on device"),
        libc::EROFS => Some("read-only filesystem; cannot write here"),
        libc::ELOOP => Some("too many symbolic link levels; possible symlink cycle"),
        libc::ENAMETOOLONG => Some("filename or path too long; shorten path segments"),
        libc::EMFILE => Some("process file descriptor limit reached; close files or raise limits"),
        libc::ENFILE => Some("system-wide file table overflow; reduce open files"),
        _ => None,
    }
}

#[cfg(windows)]
fn hint_for_os_code(code: i32) -> Option<&'static str> {
    match code {
        5 => Some("access denied; check permissions"),
        17 => Some("not same device; cross-filesystem move"),
        32 => Some("sharing violation; file is in use"),
        2 | 3 => Some("path not found; verify it exists"),
        80 => Some("already exists; pick a unique name"),
        112 => Some("insufficient disk space"),
        206 => Some("filename or path too long"),
        _ => None,
    }
}

#[cfg(not(any(unix, windows)))]
fn hint_for_os_code(_code: i32) -> Option<&'static str> {
    None
}

fn hint_for_kind(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; verify it exists"),
        io::ErrorKind::AlreadyExists => Some("already exists; remove or choose a unique name"),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            Some("busy/timed out; retry after the current write finishes")
        }
        _ => None,
    }
}

/// Human-friendly message with op/path plus platform-aware hints.
pub(crate) fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    match e.raw_os_error() {
        Some(code) => {
            if let Some(hint) = hint_for_os_code(code) {
                msg.push_str(" (");
                msg.push_str(hint);
                msg.push(')');
            }
            msg.push_str(&format!(" [os code: {code}]"));
        }
        None => {
            if let Some(hint) = hint_for_kind(e.kind()) {
                msg.push_str(" (");
                msg.push_str(hint);
                msg.push(')');
            }
        }
    }
    msg
}

/// Returns a closure for `.map_err(...)` converting `io::Error` into
/// `ShareError::LocalIo`, keeping the original error as the source.
pub fn io_error_with_help<'a>(op: &'a str, path: &'a Path) -> impl FnOnce(io::Error) -> ShareError + 'a {
    move |e: io::Error| ShareError::LocalIo {
        message: build_message(op, path, &e),
        source: e,
    }
}
