//! Core configuration types.
//! - Config holds connection/share identity and transfer defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use super::{CONNECTION_DEFAULT, SHARE_DEFAULT};
use crate::transfer::{CHUNK_THRESHOLD, TransferOptions};

/// Program-defined verbosity levels exposed to config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Warnings and job summaries (default)
    #[default]
    Normal,
    /// Per-file progress
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" | "warn" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Default `EnvFilter` directive for this level.
    pub fn filter_directive(self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn,share_transfer=info",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for a share session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Opaque connection identity handed to the store backend
    pub connection: String,
    /// Share name
    pub share: String,
    /// Create the share on first use when missing
    pub create_share: bool,
    /// Log verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Defaults for transfer calls
    pub options: TransferOptions,
    /// Upload chunk size in bytes
    pub chunk_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: CONNECTION_DEFAULT.to_string(),
            share: SHARE_DEFAULT.to_string(),
            create_share: true,
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path(),
            options: TransferOptions::default(),
            chunk_size: CHUNK_THRESHOLD,
        }
    }
}

impl Config {
    /// Construct a Config for the given connection and share; other fields use defaults.
    pub fn new(connection: impl Into<String>, share: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            share: share.into(),
            ..Default::default()
        }
    }
}
