//! Resolved service configuration

use std::path::{Path, PathBuf};

use xjp_common::config::TomlConfig;

/// Settings after CLI, environment, TOML and defaults have been merged
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub image_max_width: u32,
    pub jpeg_quality: u8,
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    /// Defaults for everything but the root folder
    pub fn with_root(root_folder: impl Into<PathBuf>) -> Self {
        Self::from_toml(root_folder.into(), &TomlConfig::default())
    }

    pub fn from_toml(root_folder: PathBuf, toml: &TomlConfig) -> Self {
        Self {
            root_folder,
            host: toml.host.clone(),
            port: toml.port,
            image_max_width: toml.image_max_width.max(1),
            jpeg_quality: toml.jpeg_quality.clamp(1, 100),
            max_upload_bytes: toml.max_upload_bytes,
        }
    }

    /// Apply CLI/environment overrides (highest priority)
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// `<root>/uploads`, served under `/uploads`
    pub fn uploads_dir(&self) -> PathBuf {
        self.root_folder.join("uploads")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
