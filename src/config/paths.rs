//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV_VAR;

const APP_DIR: &str = "share_transfer";

/// OS-appropriate default config path, honouring `SHARE_TRANSFER_CONFIG`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(p));
    }
    if let Some(mut base) = config_dir() {
        base.push(APP_DIR);
        base.push("config.xml");
        Some(base)
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join(APP_DIR)
                .join("config.xml")
        })
    }
}

/// OS-appropriate default log file path (data dir). Nothing is created here.
pub fn default_log_path() -> Option<PathBuf> {
    if let Some(mut base) = data_dir() {
        base.push(APP_DIR);
        base.push("share_transfer.log");
        Some(base)
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join(APP_DIR)
                .join("share_transfer.log")
        })
    }
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.as_os_str().is_empty() {
            break;
        }
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        p = anc.parent();
    }
    Ok(false)
}
