//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request.
//!
//! Unknown XML elements are rejected so typos surface as errors instead of
//! silently falling back to defaults.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use super::{CONFIG_ENV_VAR, CONNECTION_DEFAULT, SHARE_DEFAULT};
use crate::transfer::{CHUNK_THRESHOLD, DEFAULT_MAX_TOTAL_BYTES};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    connection: Option<String>,
    share: Option<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    create_share: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    allow_overwrite: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    create_parent_dirs: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    recurse: Option<bool>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    max_total_bytes: Option<u64>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    chunk_size: Option<u64>,
}

// Trims surrounding whitespace; unparsable values fall back to the default.
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.trim().parse::<u64>().ok()))
}

fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }))
}

fn trimmed(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string)
}

// Map XmlConfig -> Config; missing fields keep their defaults.
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    if let Some(c) = trimmed(parsed.connection.as_deref()) {
        cfg.connection = c;
    }
    if let Some(s) = trimmed(parsed.share.as_deref()) {
        cfg.share = s;
    }
    if let Some(b) = parsed.create_share {
        cfg.create_share = b;
    }
    if let Some(level) = trimmed(parsed.log_level.as_deref()).and_then(|s| s.parse::<LogLevel>().ok()) {
        cfg.log_level = level;
    }
    if let Some(f) = trimmed(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(f));
    }

    if let Some(b) = parsed.allow_overwrite {
        cfg.options.allow_overwrite = b;
    }
    if let Some(b) = parsed.create_parent_dirs {
        cfg.options.create_parent_dirs = b;
    }
    if let Some(b) = parsed.recurse {
        cfg.options.recurse = b;
    }
    if let Some(n) = parsed.max_total_bytes {
        cfg.options.max_total_bytes = n;
    }
    if let Some(n) = parsed.chunk_size {
        cfg.chunk_size = n;
    }

    cfg
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig =
        from_xml_str(&contents).with_context(|| format!("parse config xml '{}'", path.display()))?;
    debug!("Loaded config from {}", path.display());
    Ok(xml_to_config(parsed))
}

/// If SHARE_TRANSFER_CONFIG is set, load and return that Config; otherwise Ok(None).
pub fn load_config_from_env() -> Result<Option<Config>> {
    match env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        Some(p) => {
            let cfg = load_config_from_xml_path(Path::new(&p))
                .with_context(|| format!("{CONFIG_ENV_VAR} points at an unusable config"))?;
            Ok(Some(cfg))
        }
        None => Ok(None),
    }
}

/// Try loading Config from the default config.xml path.
/// Returns Ok(Some(cfg)) if the file exists and parses; Ok(None) if missing.
pub fn load_config_from_default_xml() -> Result<Option<Config>> {
    let path = default_config_path().context("resolve default config path")?;
    if !path.exists() {
        return Ok(None);
    }
    let cfg = load_config_from_xml_path(&path)?;
    Ok(Some(cfg))
}

fn template_contents() -> String {
    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/share_transfer.log".into());
    format!(
        "<!--\n  share_transfer configuration (XML)\n\n  connection          -> connection identity passed to the store backend\n  share               -> share name (3-63 chars: a-z, 0-9, single hyphens)\n  create_share        -> create the share on first use (true/false)\n  log_level           -> quiet | normal | info | debug\n  log_file            -> path to log file (optional)\n  allow_overwrite     -> replace existing destination files (true/false)\n  create_parent_dirs  -> create missing parent directories (true/false)\n  recurse             -> descend into subdirectories for directory jobs\n  max_total_bytes     -> size ceiling for one directory transfer\n  chunk_size          -> upload range size in bytes (max 4194304)\n-->\n<config>\n  <connection>{CONNECTION_DEFAULT}</connection>\n  <share>{SHARE_DEFAULT}</share>\n  <create_share>true</create_share>\n  <log_level>normal</log_level>\n  <log_file>{suggested_log}</log_file>\n  <allow_overwrite>true</allow_overwrite>\n  <create_parent_dirs>true</create_parent_dirs>\n  <recurse>true</recurse>\n  <max_total_bytes>{DEFAULT_MAX_TOTAL_BYTES}</max_total_bytes>\n  <chunk_size>{CHUNK_THRESHOLD}</chunk_size>\n</config>\n"
    )
}

/// Create a template config file and its parent directory.
/// Refuses symlinked ancestors and never overwrites an existing file.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!("Refusing to create config: ancestor of {} is a symlink", path.display());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create config directory '{}'", parent.display()))?;
    }

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600).custom_flags(libc::O_NOFOLLOW);
    }
    let mut file = opts
        .open(path)
        .with_context(|| format!("create config file '{}'", path.display()))?;
    file.write_all(template_contents().as_bytes())
        .with_context(|| format!("write config file '{}'", path.display()))?;
    file.sync_all()?;

    info!("Created template config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_round_trips_to_defaults() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("cfg/config.xml");
        create_template_config(&path).unwrap();
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert_eq!(cfg.connection, CONNECTION_DEFAULT);
        assert_eq!(cfg.share, SHARE_DEFAULT);
        assert_eq!(cfg.chunk_size, CHUNK_THRESHOLD);
        assert_eq!(cfg.options.max_total_bytes, DEFAULT_MAX_TOTAL_BYTES);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn template_is_not_overwritten() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("config.xml");
        fs::write(&path, "<config/>").unwrap();
        assert!(create_template_config(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "<config/>");
    }
}
