//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use validate::validate_share_name;
pub use xml::{
    create_template_config, load_config_from_default_xml, load_config_from_env, load_config_from_xml_path,
};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SHARE_TRANSFER_CONFIG";

/// Defaults used when no config file is present.
pub const CONNECTION_DEFAULT: &str = "local";
pub const SHARE_DEFAULT: &str = "shared";
