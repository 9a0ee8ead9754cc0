//! Runtime configuration for playstack-vr

use playstack_common::config::{resolve_work_root, ToolsConfig, TomlConfig};
use std::path::PathBuf;

pub const MODULE_NAME: &str = "playstack-vr";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5781;

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub work_root: PathBuf,
    pub max_upload_bytes: usize,
    pub max_concurrent_jobs: usize,
    pub retained_jobs: usize,
    pub accepted_extensions: Vec<String>,
    pub tools: ToolsConfig,
}

impl ServiceConfig {
    pub fn from_toml(toml: &TomlConfig) -> Self {
        Self {
            host: toml.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: toml.port.unwrap_or(DEFAULT_PORT),
            work_root: resolve_work_root(toml.work_root.as_deref()),
            max_upload_bytes: toml.max_upload_bytes,
            max_concurrent_jobs: toml.max_concurrent_jobs,
            retained_jobs: toml.retained_jobs,
            accepted_extensions: toml.accepted_extensions.clone(),
            tools: toml.tools.clone(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default())
    }
}
