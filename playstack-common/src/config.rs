//! Configuration loading and path resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (handled by each binary with clap)
//! 2. Environment variables (`SOUNDFONT_PATH`, per-binary `PLAYSTACK_*`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing config file is never fatal: the service logs a warning and
//! starts with defaults. An explicitly requested file that is missing or
//! malformed is a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the soundfont location
pub const SOUNDFONT_ENV: &str = "SOUNDFONT_PATH";

/// Soundfont file expected next to the working directory when nothing else is configured
pub const DEFAULT_SOUNDFONT: &str = "FluidR3_GM.sf2";

/// Upload size cap applied when the config does not set one (200 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Bootstrap configuration loaded from TOML
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Bind address; each binary supplies its own default
    pub host: Option<String>,
    /// HTTP port; each binary supplies its own default
    pub port: Option<u16>,
    /// Parent directory for per-request job directories
    pub work_root: Option<PathBuf>,
    /// Soundfont used by the synthesizer (overridden by `SOUNDFONT_PATH`)
    pub soundfont: Option<PathBuf>,
    /// Synthesizer output sample rate
    pub sample_rate: u32,
    /// Maximum accepted request body (uploads)
    pub max_upload_bytes: usize,
    /// Pipelines allowed to run at the same time
    pub max_concurrent_jobs: usize,
    /// Completed jobs kept available for download
    pub retained_jobs: usize,
    /// Upload extensions accepted by the input acquirer (without dot)
    pub accepted_extensions: Vec<String>,
    /// External executables
    pub tools: ToolsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            work_root: None,
            soundfont: None,
            sample_rate: 44_100,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_concurrent_jobs: 1,
            retained_jobs: 16,
            accepted_extensions: vec!["mp3".to_string(), "wav".to_string()],
            tools: ToolsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Reject values the services cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::Config("sample_rate must be greater than 0".to_string()));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(Error::Config(
                "max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        if self.retained_jobs == 0 {
            return Err(Error::Config("retained_jobs must be at least 1".to_string()));
        }
        if self.accepted_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(Error::Config(
                "accepted_extensions must list at least one extension".to_string(),
            ));
        }
        Ok(())
    }
}

/// External executable names or paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub yt_dlp: String,
    /// Appended before the output template, e.g. `--legacy-server-connect`
    pub yt_dlp_extra_args: Vec<String>,
    pub basic_pitch: String,
    pub lilypond: String,
    pub fluidsynth: String,
    pub ffmpeg: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            yt_dlp_extra_args: Vec::new(),
            basic_pitch: "basic-pitch".to_string(),
            lilypond: "lilypond".to_string(),
            fluidsynth: "fluidsynth".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `~/.config/playstack/<module>.toml` (platform equivalent elsewhere)
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("playstack").join(format!("{}.toml", module_name)))
}

/// Parse TOML content into a validated config
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    let config: TomlConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
    config.validate()?;
    Ok(config)
}

/// Load configuration for a module
///
/// `explicit` comes from `--config`; it must exist. Without it the default
/// per-user location is tried and silently skipped when absent.
pub fn load_toml_config(explicit: Option<&Path>, module_name: &str) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config {} failed: {}", path.display(), e))
        })?;
        info!("Loaded config from {}", path.display());
        return parse_toml_config(&content);
    }

    match default_config_path(module_name) {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Read config {} failed: {}", path.display(), e))
            })?;
            info!("Loaded config from {}", path.display());
            parse_toml_config(&content)
        }
        Some(path) => {
            warn!(
                "No config file at {}; using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory; using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Resolve the soundfont path
///
/// `SOUNDFONT_PATH` > config file value > `FluidR3_GM.sf2` relative to the
/// working directory. Existence is checked by the synthesizer stage, not here.
pub fn resolve_soundfont(configured: Option<&Path>) -> PathBuf {
    if let Ok(path) = std::env::var(SOUNDFONT_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    PathBuf::from(DEFAULT_SOUNDFONT)
}

/// Parent directory for job directories (system temp dir when unset)
pub fn resolve_work_root(configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(path) => path.to_path_buf(),
        None => std::env::temp_dir().join("playstack"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_toml_config("").unwrap();
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.max_concurrent_jobs, 1);
        assert_eq!(config.accepted_extensions, vec!["mp3", "wav"]);
        assert_eq!(config.tools.fluidsynth, "fluidsynth");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = parse_toml_config("max_concurrent_jobs = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn work_root_defaults_under_temp_dir() {
        let root = resolve_work_root(None);
        assert!(root.starts_with(std::env::temp_dir()));
        assert_eq!(
            resolve_work_root(Some(Path::new("/srv/jobs"))),
            PathBuf::from("/srv/jobs")
        );
    }
}
