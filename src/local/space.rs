//! Free-space precheck for downloads.

use std::path::Path;

use tracing::{debug, warn};

use super::LocalFs;
use crate::errors::{Result, ShareError};

/// Headroom kept free on top of the payload.
const SPACE_CUSHION: u64 = 4 * 1024 * 1024;

pub fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let f = n as f64;
    if f >= GB {
        format!("{:.1} GiB", f / GB)
    } else if f >= MB {
        format!("{:.1} MiB", f / MB)
    } else if f >= KB {
        format!("{:.1} KiB", f / KB)
    } else {
        format!("{n} B")
    }
}

/// Closest ancestor of `path` (or `path` itself) that exists.
fn nearest_existing<'p, L: LocalFs + ?Sized>(local: &L, path: &'p Path) -> Option<&'p Path> {
    path.ancestors()
        .find(|p| !p.as_os_str().is_empty() && local.exists(p))
}

/// Fail with `InsufficientSpace` when the volume holding `dest` cannot take
/// `required` more bytes. A probe that cannot run is logged and skipped.
pub fn ensure_space_for<L: LocalFs + ?Sized>(local: &L, dest: &Path, required: u64) -> Result<()> {
    if required == 0 {
        return Ok(());
    }
    let probe_at = nearest_existing(local, dest).unwrap_or(Path::new("."));
    let available = match local.available_space(probe_at) {
        Ok(n) => n,
        Err(e) => {
            warn!(path = %probe_at.display(), error = %e, "free-space probe failed; skipping check");
            return Ok(());
        }
    };
    debug!(
        path = %probe_at.display(),
        need = %format_bytes(required),
        free = %format_bytes(available),
        "free-space probe"
    );
    if available < required.saturating_add(SPACE_CUSHION) {
        return Err(ShareError::InsufficientSpace {
            required,
            available,
            dest: dest.to_path_buf(),
        });
    }
    Ok(())
}
