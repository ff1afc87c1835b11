//! Bootstrap configuration loading and root folder resolution
//!
//! Configuration file priority:
//! 1. Command-line argument (highest priority)
//! 2. `RUGDESK_CONFIG` environment variable
//! 3. Platform config directory (`~/.config/rugdesk/rugdesk.toml` on Linux)
//!
//! A missing config file is never fatal: the service logs a warning and
//! starts with compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RUGDESK_CONFIG";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "RUGDESK_ROOT_FOLDER";

const CONFIG_FILE_NAME: &str = "rugdesk.toml";
const APP_DIR_NAME: &str = "rugdesk";

/// Bootstrap configuration loaded from TOML
///
/// Every section is optional; absent keys take compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder for stored objects (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub compression: CompressionConfig,

    #[serde(default)]
    pub signing: SigningConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Photo upload pipeline tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Files uploaded concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Retries after the first failed attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound (exclusive) of random jitter added to each backoff
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

/// Client-side image compression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Longest image side after downscaling, in pixels
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Signed URL settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
    /// Public base URL used in signed links (defaults to the listen address)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            secret: None,
            default_ttl_seconds: default_ttl_seconds(),
            public_base_url: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5740
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_batch_size() -> usize {
    4
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_jitter_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_max_dimension() -> u32 {
    2048
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_ttl_seconds() -> u64 {
    3600
}

impl TomlConfig {
    /// Reject values the services cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.upload.batch_size == 0 {
            return Err(Error::Config("upload.batch_size must be at least 1".to_string()));
        }
        if !(1..=100).contains(&self.compression.jpeg_quality) {
            return Err(Error::Config(format!(
                "compression.jpeg_quality must be 1-100, got {}",
                self.compression.jpeg_quality
            )));
        }
        if self.compression.max_dimension == 0 {
            return Err(Error::Config(
                "compression.max_dimension must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Write config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

/// Locate the config file: CLI argument → ENV → platform config directory.
///
/// Returns `None` when no candidate exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

/// Where the bootstrap configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No config file found; compiled defaults in use
    Defaults,
}

impl ConfigSource {
    /// Emit the startup log line describing this source
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Defaults => warn!("No config file found, using compiled defaults"),
        }
    }
}

/// Load bootstrap configuration without logging.
///
/// Used before a tracing subscriber exists; the caller logs the returned
/// [`ConfigSource`] once logging is up. An explicitly named file (CLI or
/// ENV) that fails to load is an error; an absent default file is not.
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    let explicit = cli_arg.is_some() || std::env::var(CONFIG_ENV_VAR).is_ok();

    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        Some(path) if explicit => Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        ))),
        _ => Ok((TomlConfig::default(), ConfigSource::Defaults)),
    }
}

/// Load bootstrap configuration with graceful degradation, logging the source
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let (config, source) = load_config(cli_arg)?;
    source.log();
    Ok(config)
}

/// Root folder resolution priority:
/// 1. Command-line argument (highest priority)
/// 2. `RUGDESK_ROOT_FOLDER` environment variable
/// 3. TOML `root_folder`
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./rugdesk_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.server.port, 5740);
        assert_eq!(config.upload.batch_size, 4);
        assert_eq!(config.upload.max_retries, 2);
        assert_eq!(config.upload.base_delay_ms, 1000);
        assert_eq!(config.upload.max_jitter_ms, 500);
        assert!(config.compression.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str("[upload]\nbatch_size = 8\n").unwrap();
        assert_eq!(config.upload.batch_size, 8);
        assert_eq!(config.upload.max_retries, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = TomlConfig::default();
        config.upload.batch_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_quality() {
        let mut config = TomlConfig::default();
        config.compression.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }
}
