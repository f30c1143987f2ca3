//! Config validation logic.
//! Checks identities, share-name syntax, chunk bounds and the transfer ceiling.

use anyhow::{Result, bail};
use tracing::{error, info};

use super::types::Config;
use crate::store::MAX_RANGE_BYTES;

impl Config {
    /// Validate the settings before any store is contacted.
    pub fn validate(&self) -> Result<()> {
        if self.connection.trim().is_empty() {
            error!("connection is empty");
            bail!("connection must not be empty");
        }

        validate_share_name(&self.share)?;

        if self.chunk_size == 0 || self.chunk_size > MAX_RANGE_BYTES {
            error!("chunk_size out of range: {}", self.chunk_size);
            bail!(
                "chunk_size must be between 1 and {MAX_RANGE_BYTES} bytes; got {}",
                self.chunk_size
            );
        }

        if self.options.max_total_bytes == 0 {
            bail!("max_total_bytes must be greater than zero");
        }

        info!(
            "Config validated: share='{}' chunk_size={} max_total_bytes={} log_file='{}'",
            self.share,
            self.chunk_size,
            self.options.max_total_bytes,
            self.log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".into())
        );
        Ok(())
    }
}

/// Share names: 3-63 chars of lowercase letters, digits and single hyphens,
/// beginning and ending with a letter or digit.
pub fn validate_share_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if !(3..=63).contains(&len) {
        bail!("share name '{name}' must be 3 to 63 characters long");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!("share name '{name}' may only contain lowercase letters, digits and hyphens");
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("share name '{name}' must start and end with a letter or digit");
    }
    if name.contains("--") {
        bail!("share name '{name}' must not contain consecutive hyphens");
    }
    Ok(())
}
