use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BACKEND_BASE: &str = "http://localhost:8000";
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Heights the server-side MP4 merge accepts.
pub const QUALITY_HEIGHTS: [u32; 8] = [2160, 1440, 1080, 720, 480, 360, 240, 144];

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MergeConfig {
    pub default_height: u32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            default_height: DEFAULT_HEIGHT,
        }
    }
}

/// Argv overrides for the desktop integration. Empty means autodetect.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DesktopConfig {
    pub clipboard_command: Option<Vec<String>>,
    pub open_command: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub backend_base: String,
    pub request_timeout_secs: Option<u64>,
    pub logging: LoggingConfig,
    pub merge: MergeConfig,
    pub desktop: DesktopConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_base: DEFAULT_BACKEND_BASE.to_string(),
            request_timeout_secs: None,
            logging: LoggingConfig::default(),
            merge: MergeConfig::default(),
            desktop: DesktopConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `BACKEND_BASE` and then the explicit flag, in that order.
    pub fn with_overrides(mut self, backend: Option<&str>) -> Result<Self> {
        if let Ok(base) = std::env::var("BACKEND_BASE") {
            if !base.trim().is_empty() {
                self.backend_base = base;
            }
        }
        if let Some(base) = backend {
            self.backend_base = base.to_string();
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let base = Url::parse(self.backend_base.trim())
            .with_context(|| format!("Invalid backend base URL: {}", self.backend_base))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("Backend base URL cannot carry paths: {}", self.backend_base);
        }
        if !QUALITY_HEIGHTS.contains(&self.merge.default_height) {
            anyhow::bail!(
                "merge.default_height must be one of {:?}, got {}",
                QUALITY_HEIGHTS,
                self.merge.default_height
            );
        }
        Ok(())
    }

    pub fn get_logging_format(&self) -> &str {
        &self.logging.format
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

pub fn get_config_path(explicit: Option<&str>) -> Option<String> {
    if let Some(path) = explicit {
        return Some(path.to_string());
    }

    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/pksyou/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/pksyou/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}
