//! Configuration loading and root folder resolution
//!
//! Settings sources, highest priority first:
//!
//! 1. Command-line arguments (`--root-folder`, `--port`, `--host`)
//! 2. Environment variables (`XJP_ROOT_FOLDER`, `XJP_DS_PORT`, `XJP_DS_HOST`)
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! A missing or unparsable TOML file is never fatal: a warning is logged and
//! the compiled defaults apply.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming the service root folder
pub const ROOT_FOLDER_ENV: &str = "XJP_ROOT_FOLDER";

/// Environment variable giving the data service origin used by clients and
/// for media URL resolution
pub const API_BASE_URL_ENV: &str = "XJP_API_BASE_URL";

/// Config file name looked up inside the root folder
pub const CONFIG_FILE_NAME: &str = "xjp-ds.toml";

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional in the file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Root folder override (below CLI and environment)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Uploaded images wider than this are downscaled
    #[serde(default = "default_image_max_width")]
    pub image_max_width: u32,

    /// JPEG quality (1-100) for re-encoded images
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Request body limit for uploads and document saves
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        TomlConfig {
            port: default_port(),
            host: default_host(),
            root_folder: None,
            image_max_width: default_image_max_width(),
            jpeg_quality: default_jpeg_quality(),
            max_upload_bytes: default_max_upload_bytes(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    3001
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_image_max_width() -> u32 {
    1024
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Root folder resolution:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. `root_folder` from the TOML config
/// 4. Current directory (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_root: Option<&Path>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = toml_root {
        return path.to_path_buf();
    }

    // Priority 4: compiled default
    default_root_folder()
}

/// Current working directory, or `.` when it cannot be determined
pub fn default_root_folder() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Locate the config file.
///
/// An explicit path is used as is. Otherwise `<root>/xjp-ds.toml` is tried,
/// then the per-user `<config dir>/xjp/xjp-ds.toml`.
pub fn find_config_file(explicit: Option<&Path>, root_folder: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let in_root = root_folder.map(|root| root.join(CONFIG_FILE_NAME));
    let user_config = dirs::config_dir().map(|dir| dir.join("xjp").join(CONFIG_FILE_NAME));

    [in_root, user_config]
        .into_iter()
        .flatten()
        .find(|path| path.exists())
}

/// Where the effective TOML config came from
#[derive(Debug)]
pub enum ConfigSource {
    /// No config file was found
    Defaults,
    /// Loaded from this file
    File(PathBuf),
    /// The file exists but could not be read or parsed; defaults apply
    Failed { path: PathBuf, error: Error },
}

impl ConfigSource {
    /// Report the outcome. Called once logging is up, since the config
    /// itself decides the log level.
    pub fn log(&self) {
        match self {
            ConfigSource::Defaults => info!("No config file found, using defaults"),
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Failed { path, error } => {
                warn!("Failed to load config {}: {}; using defaults", path.display(), error)
            }
        }
    }
}

/// Load the TOML config with graceful degradation.
///
/// No file, an unreadable file, or invalid TOML all yield the defaults. The
/// returned [`ConfigSource`] says which case applied.
pub fn load_toml_config(
    explicit: Option<&Path>,
    root_folder: Option<&Path>,
) -> (TomlConfig, ConfigSource) {
    let Some(path) = find_config_file(explicit, root_folder) else {
        return (TomlConfig::default(), ConfigSource::Defaults);
    };

    match TomlConfig::from_file(&path) {
        Ok(config) => (config, ConfigSource::File(path)),
        Err(error) => (TomlConfig::default(), ConfigSource::Failed { path, error }),
    }
}

/// Data service origin from `XJP_API_BASE_URL`, trailing slash removed
pub fn api_base_url_from_env() -> Option<String> {
    std::env::var(API_BASE_URL_ENV)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
}
